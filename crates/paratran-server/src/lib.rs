//! # paratran-server
//!
//! HTTP surface of the transcription service.
//!
//! | Method | Path          | Body                        | Response                     |
//! |--------|---------------|-----------------------------|------------------------------|
//! | GET    | `/health`     |                             | `{status, model, model_dir}` |
//! | POST   | `/transcribe` | multipart field `file`      | canonical result JSON        |
//!
//! `/transcribe` takes every decoding parameter as a query parameter.
//! Input problems answer 400 `{"error": msg}`; model and engine failures
//! answer 500 with the same shape.
//!
//! ## Crate Position
//!
//! Depends on: paratran-core.
//! Depended on by: paratran.

#![deny(unsafe_code)]

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ServerError};
pub use server::{AppState, ServerConfig, ServerHandle, build_router, start};
