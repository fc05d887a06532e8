//! Storeroom configuration (container grid + admin secret).

use serde::{Deserialize, Serialize};

use stockroom_auth::StaticCredentialVerifier;
use stockroom_inventory::CabinetLayout;

pub const ENV_CABINETS: &str = "STOREROOM_CABINETS";
pub const ENV_SHELVES_PER_CABINET: &str = "STOREROOM_SHELVES_PER_CABINET";
pub const ENV_CONTAINERS_PER_SHELF: &str = "STOREROOM_CONTAINERS_PER_SHELF";
pub const ENV_ADMIN_SECRET: &str = "STOREROOM_ADMIN_SECRET";

const DEV_ADMIN_SECRET: &str = "dev-admin-secret-change-me";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid number: {reason}")]
    InvalidNumber {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid cabinet layout: {0}")]
    InvalidLayout(String),

    #[error("admin secret cannot be empty")]
    EmptyAdminSecret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreroomConfig {
    pub layout: CabinetLayout,
    pub admin_secret: String,
}

impl Default for StoreroomConfig {
    fn default() -> Self {
        Self {
            layout: CabinetLayout::default(),
            admin_secret: DEV_ADMIN_SECRET.to_string(),
        }
    }
}

impl StoreroomConfig {
    /// Load from `STOREROOM_*` environment variables; unset values fall back
    /// to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = CabinetLayout::default();
        let layout = CabinetLayout {
            cabinets: number(&lookup, ENV_CABINETS, defaults.cabinets)?,
            shelves_per_cabinet: number(&lookup, ENV_SHELVES_PER_CABINET, defaults.shelves_per_cabinet)?,
            containers_per_shelf: number(&lookup, ENV_CONTAINERS_PER_SHELF, defaults.containers_per_shelf)?,
        };

        let admin_secret = lookup(ENV_ADMIN_SECRET).unwrap_or_else(|| {
            tracing::warn!("{ENV_ADMIN_SECRET} not set; using insecure dev default");
            DEV_ADMIN_SECRET.to_string()
        });

        let config = Self { layout, admin_secret };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout
            .validate()
            .map_err(|e| ConfigError::InvalidLayout(e.to_string()))?;
        if self.admin_secret.trim().is_empty() {
            return Err(ConfigError::EmptyAdminSecret);
        }
        Ok(())
    }

    /// Verifier backed by the configured admin secret.
    pub fn credential_verifier(&self) -> StaticCredentialVerifier {
        StaticCredentialVerifier::new(self.admin_secret.clone())
    }
}

fn number<F>(lookup: &F, var: &'static str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidNumber {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_variables_use_defaults() {
        let config = StoreroomConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StoreroomConfig::default());
        assert_eq!(config.layout.cabinets, 3);
        assert_eq!(config.layout.shelves_per_cabinet, 5);
        assert_eq!(config.layout.containers_per_shelf, 4);
    }

    #[test]
    fn variables_override_defaults() {
        let config = StoreroomConfig::from_lookup(lookup(&[
            (ENV_CABINETS, "2"),
            (ENV_SHELVES_PER_CABINET, " 3 "),
            (ENV_ADMIN_SECRET, "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.layout.cabinets, 2);
        assert_eq!(config.layout.shelves_per_cabinet, 3);
        assert_eq!(config.layout.containers_per_shelf, 4);
        assert_eq!(config.admin_secret, "s3cret");
    }

    #[test]
    fn unparsable_number_is_an_error() {
        let err = StoreroomConfig::from_lookup(lookup(&[(ENV_CABINETS, "three")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { var: ENV_CABINETS, .. }));
    }

    #[test]
    fn zero_or_oversized_grids_are_rejected() {
        let zero = StoreroomConfig::from_lookup(lookup(&[(ENV_CABINETS, "0")])).unwrap_err();
        assert!(matches!(zero, ConfigError::InvalidLayout(_)));

        let too_many_letters = StoreroomConfig::from_lookup(lookup(&[
            (ENV_SHELVES_PER_CABINET, "7"),
            (ENV_CONTAINERS_PER_SHELF, "4"),
        ]))
        .unwrap_err();
        assert!(matches!(too_many_letters, ConfigError::InvalidLayout(_)));
    }

    #[test]
    fn blank_secret_is_rejected() {
        let err = StoreroomConfig::from_lookup(lookup(&[(ENV_ADMIN_SECRET, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::EmptyAdminSecret);
    }

    #[test]
    fn deserializes_with_partial_fields() {
        let config: StoreroomConfig =
            serde_json::from_str(r#"{"admin_secret":"abc"}"#).unwrap();
        assert_eq!(config.layout, CabinetLayout::default());
        assert_eq!(config.admin_secret, "abc");
    }
}
