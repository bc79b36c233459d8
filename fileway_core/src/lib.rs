//! # fileway_core
//!
//! The conduit subsystem of the fileway relay service: the in-memory
//! registry of pending transfers, the per-transfer state machine
//! coordinating a single sender with a single receiver, the chunk-plan
//! protocol, the latch-based rendezvous, and the staleness-driven garbage
//! collection of abandoned transfers.
//!
//! This crate has no HTTP dependency. It is wired to the network by
//! `fileway_server`, which implements the five external operations
//! (`setup`, `ping`, `ul`, `ddl`, `cleanup`) in terms of the types here.
pub mod chunk_plan;
pub mod config;
mod conduit;
mod conduit_set;
pub mod errors;
mod id;
mod latch;

pub use chunk_plan::build_chunk_plan;
pub use conduit::Conduit;
pub use conduit_set::ConduitSet;
pub use config::Config;
pub use errors::ConduitError;
pub use id::gen_random_string;
pub use latch::Latch;
