// File: src/test_utils/mod.rs
//
// Hermetic doubles for the external collaborators: in-memory repositories,
// a scriptable connection adapter, and a recording job handler. Used by the
// integration tests under `tests/`.

pub mod memory_repos;
pub mod scripted_adapter;

pub use memory_repos::{
    MemoryAccountRepo, MemoryContactRepo, MemoryMessageRepo, MemoryQueueRepo, MemoryTicketRepo,
};
pub use scripted_adapter::{AdapterHandle, RecordingJobHandler, ScriptedAdapterFactory};
