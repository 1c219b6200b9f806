//! Identifier and identity types shared by every crate in the workspace.

mod types;

pub use types::{Credential, OrderId, VerifiedIdentity};
