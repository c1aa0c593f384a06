// File: src/ingest/mod.rs

pub mod normalizer;
pub mod router;

pub use normalizer::normalize;
pub use router::InboundRouter;
