//! Dispatch errors.

use paratran_core::TranscribeError;

/// Failure of one dispatched request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The in-process orchestrator failed, or a local pre-upload check did.
    #[error(transparent)]
    Local(#[from] TranscribeError),

    /// The remote service answered with a non-2xx status.
    #[error("Server error ({status}): {body}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Response body as sent by the server.
        body: String,
    },

    /// The remote service could not be reached.
    #[error("Cannot connect to server at {url}: {message}")]
    Connection {
        /// Base URL of the remote service.
        url: String,
        /// Transport error text.
        message: String,
    },

    /// The remote service answered 2xx with a body that is not a result.
    #[error("Invalid response from {url}: {message}")]
    InvalidResponse {
        /// Base URL of the remote service.
        url: String,
        /// Decode error text.
        message: String,
    },
}

impl DispatchError {
    /// Whether the remaining files of a batch should be skipped.
    ///
    /// True when the target itself is unusable: the server is unreachable or
    /// the local model cannot be loaded.
    pub fn aborts_batch(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Local(TranscribeError::ModelLoad(_))
        )
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_user_input(&self) -> bool {
        match self {
            Self::Local(e) => e.is_user_input(),
            Self::Remote { status, .. } => (400..500).contains(status),
            Self::Connection { .. } | Self::InvalidResponse { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn abort_classification() {
        let connection = DispatchError::Connection {
            url: "http://x".into(),
            message: "refused".into(),
        };
        assert!(connection.aborts_batch());
        assert!(DispatchError::Local(TranscribeError::ModelLoad("gone".into())).aborts_batch());

        let rejected = DispatchError::Remote {
            status: 400,
            body: "{}".into(),
        };
        assert!(!rejected.aborts_batch());
        assert!(rejected.is_user_input());
        assert!(!DispatchError::Local(TranscribeError::FileNotFound(PathBuf::from("a.wav"))).aborts_batch());
        assert!(!DispatchError::Local(TranscribeError::Inference("x".into())).aborts_batch());
    }

    #[test]
    fn messages() {
        let remote = DispatchError::Remote {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(remote.to_string(), "Server error (500): boom");
        let local = DispatchError::from(TranscribeError::InvalidParameter("bad".into()));
        assert_eq!(local.to_string(), "bad");
    }
}
