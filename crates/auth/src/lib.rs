//! `stockroom-auth` — admin authorization boundary for controlled components.
//!
//! Credential checking itself (passwords, tokens) lives outside the core and is
//! plugged in through [`CredentialVerifier`]. The core only ever sees an
//! [`AdminApproval`], which can only be obtained from [`authorize`].

pub mod authorize;
pub mod credential;

pub use authorize::{AdminAction, AdminApproval, AuthzError, authorize};
pub use credential::{AdminCredential, CredentialVerifier, StaticCredentialVerifier};
