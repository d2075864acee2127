//! Session tracking shared by the client and server managers.

pub mod handle;
pub mod registry;
