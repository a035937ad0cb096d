//! MCP transport errors.

/// Failure of the stdio transport itself.
///
/// Per-request problems never surface here; they become JSON-RPC error
/// responses or `isError` tool results.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// Reading stdin or writing stdout failed.
    #[error("stdio transport: {0}")]
    Io(#[from] std::io::Error),

    /// A response could not be encoded.
    #[error("response encoding: {0}")]
    Serialize(#[from] serde_json::Error),
}
