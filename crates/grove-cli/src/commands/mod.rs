pub mod common;
pub mod dead_letters;
pub mod drain;
pub mod enqueue;
pub mod list;
pub mod purge;
pub mod status;
pub mod validate;
