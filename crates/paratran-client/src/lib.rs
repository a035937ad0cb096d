//! # paratran-client
//!
//! Dispatch layer shared by the CLI and the MCP tool: run a request against
//! the in-process orchestrator (local mode) or forward it to a remote
//! paratran service over HTTP (remote mode), then drive batches of files
//! through the output formatter.
//!
//! ## Crate Position
//!
//! Depends on: paratran-core.
//! Depended on by: paratran-mcp, paratran.

#![deny(unsafe_code)]

pub mod backend;
pub mod batch;
pub mod error;
pub mod remote;

pub use backend::Backend;
pub use batch::{BatchOptions, BatchReport, FileOutcome, run_batch};
pub use error::DispatchError;
pub use remote::RemoteClient;
