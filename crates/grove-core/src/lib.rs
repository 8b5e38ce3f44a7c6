//! grove-core - Core library for Grove
//!
//! This crate contains the field tag-acquisition pipeline shared by all Grove
//! clients: the tag read state machine, record validation, and the durable
//! offline upload queue. Platform radios, GPS, and the upload sink are
//! external capabilities behind traits in [`platform`].

pub mod db;
pub mod error;
pub mod location;
pub mod models;
pub mod platform;
pub mod queue;
pub mod reader;
pub mod validate;

pub use error::{Error, Result};
pub use models::{FieldRecord, GpsFix, QueueEntry, TagIdentifier};
pub use queue::UploadQueue;
pub use reader::TagReader;
