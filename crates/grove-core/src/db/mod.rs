//! Database layer for the durable queue

mod connection;
mod migrations;
mod queue_repository;

pub use connection::Database;
pub use queue_repository::{DeadEntry, QueueRepository, SqliteQueueRepository};
