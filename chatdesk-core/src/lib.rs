// src/lib.rs

pub mod db;
pub mod eventbus;
pub mod ingest;
pub mod jobs;
pub mod logging;
pub mod projector;
pub mod repositories;
pub mod services;
pub mod sessions;
pub mod test_utils;

pub use db::Database;
pub use chatdesk_common::error::Error;
