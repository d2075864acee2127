//! Collaborator contracts.

pub mod store;
