use crate::error::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Service configuration, loaded from a TOML file. Every section carries
/// usable defaults so a bare config file (or none at all) still boots a
/// development instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub secret_key: String,
    /// Where the provider redirects the payer after checkout.
    pub callback_url: String,
    pub timeout_secs: u64,
    /// Smallest accepted deposit, in major currency units.
    pub minimum_deposit: Decimal,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.paystack.co".into(),
            secret_key: String::new(),
            callback_url: "http://localhost:8080/api/v1/wallet/verify-payment".into(),
            timeout_secs: 10,
            minimum_deposit: Decimal::from(100),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub public_base: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("uploads"),
            public_base: "/uploads".into(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gateway.minimum_deposit <= Decimal::ZERO {
            return Err(Error::Config("minimum_deposit must be positive".into()));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(Error::Config("gateway timeout must be non-zero".into()));
        }
        self.server
            .bind
            .parse::<std::net::SocketAddr>()
            .map_err(|e| Error::Config(format!("invalid bind address: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [gateway]
            secret_key = "sk_test_x"
            minimum_deposit = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.gateway.secret_key, "sk_test_x");
        assert_eq!(config.gateway.minimum_deposit, dec!(250));
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_invalid_bind_rejected() {
        let mut config = Config::default();
        config.server.bind = "not-an-addr".into();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
