#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod backend;
mod config;
mod error;
mod transport;
mod wire;

// ============================================================================
// Public API
// ============================================================================

pub use backend::{RemoteSession, RemoteTrainingBackend};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use transport::{EngineTransport, ReqwestTransport};
