use std::sync::Arc;

/// An admin credential as supplied by a caller (e.g. a password typed into a
/// confirmation dialog). Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredential(String);

impl AdminCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AdminCredential(<redacted>)")
    }
}

/// External authorization service.
pub trait CredentialVerifier: Send + Sync {
    fn verify_admin_credential(&self, credential: &AdminCredential) -> bool;
}

impl<V> CredentialVerifier for Arc<V>
where
    V: CredentialVerifier + ?Sized,
{
    fn verify_admin_credential(&self, credential: &AdminCredential) -> bool {
        (**self).verify_admin_credential(credential)
    }
}

/// Verifier that accepts exactly one configured secret. Intended for dev/tests.
#[derive(Clone)]
pub struct StaticCredentialVerifier {
    secret: String,
}

impl StaticCredentialVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl core::fmt::Debug for StaticCredentialVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StaticCredentialVerifier").finish_non_exhaustive()
    }
}

impl CredentialVerifier for StaticCredentialVerifier {
    fn verify_admin_credential(&self, credential: &AdminCredential) -> bool {
        let (a, b) = (self.secret.as_bytes(), credential.expose().as_bytes());
        if a.len() != b.len() || a.is_empty() {
            return false;
        }
        // Compare every byte regardless of where the first mismatch is.
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}
