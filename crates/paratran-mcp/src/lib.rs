//! # paratran-mcp
//!
//! Model Context Protocol surface: a single `transcribe` tool served as
//! newline-delimited JSON-RPC 2.0 over stdin/stdout.
//!
//! | method | reply |
//! |--------|-------|
//! | `initialize` | protocol version, `tools` capability, server info |
//! | `notifications/initialized` | none |
//! | `ping` | `{}` |
//! | `tools/list` | the `transcribe` tool and its input schema |
//! | `tools/call` | text content block, `isError` on failure |
//!
//! Requests run through [`paratran_client::Backend`], so the tool works in
//! local and remote mode alike.
//!
//! ## Crate Position
//!
//! Depends on: paratran-core, paratran-client.
//! Depended on by: paratran.

#![deny(unsafe_code)]

pub mod error;
pub mod protocol;
pub mod server;
pub mod tool;

pub use error::McpError;
pub use protocol::{RpcError, RpcRequest, RpcResponse};
pub use server::McpServer;
