//! # wirehub-core
//!
//! Shared foundation for the Wirehub transport crates:
//!
//! - Unified error type ([`error::NetError`]) and result alias
//! - Configuration schemas loaded from TOML + environment
//! - Typed session identifiers
//! - Collaborator contracts (key-value persistence delegate)

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{ErrorKind, NetError};
pub use result::NetResult;
pub use types::id::SessionId;
