//! Convenience result type alias for Wirehub.

use crate::error::NetError;

/// A specialized `Result` type for Wirehub operations.
///
/// Defined as a convenience so that every crate does not need to write
/// `Result<T, NetError>` explicitly.
pub type NetResult<T> = Result<T, NetError>;
