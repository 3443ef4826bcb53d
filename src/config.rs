use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub recon: ReconConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/credit_recon".to_string(),
            max_connections: 20,
        }
    }
}

/// Engine thresholds and rule weights, passed explicitly into the validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Minimum confidence for acceptance
    pub acceptance_threshold: f64,
    /// Maximum number of issues an accepted pair may carry
    pub max_issues: usize,
    /// A memo above this percentage of its invoice is flagged LARGE_CREDIT_AMOUNT
    pub large_credit_percent: u32,
    pub penalties: PenaltyWeights,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 80.0,
            max_issues: 1,
            large_credit_percent: 50,
            penalties: PenaltyWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    pub customer_mismatch: f64,
    pub date_sequence: f64,
    pub amount_exceeds_invoice: f64,
    pub vendor_mismatch: f64,
    pub currency_mismatch: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            customer_mismatch: 50.0,
            date_sequence: 20.0,
            amount_exceeds_invoice: 25.0,
            vendor_mismatch: 15.0,
            currency_mismatch: 10.0,
        }
    }
}

impl AppConfig {
    /// Defaults, then `credit-recon.toml`, then `RECON__*` variables, then
    /// `DATABASE_URL` / `SERVER_HOST` / `SERVER_PORT`.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("credit-recon")
    }

    pub fn load_from(file_stem: &str) -> Result<Self, config::ConfigError> {
        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .map(i64::from);

        config::Config::builder()
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(config::Environment::with_prefix("RECON").separator("__"))
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", port)?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_business_rules() {
        let cfg = ReconConfig::default();
        assert_eq!(cfg.acceptance_threshold, 80.0);
        assert_eq!(cfg.max_issues, 1);
        assert_eq!(cfg.large_credit_percent, 50);
        assert_eq!(cfg.penalties.customer_mismatch, 50.0);
        assert_eq!(cfg.penalties.currency_mismatch, 10.0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[recon]\nacceptance_threshold = 70.0\n[recon.penalties]\nvendor_mismatch = 5.0\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.recon.acceptance_threshold, 70.0);
        assert_eq!(cfg.recon.max_issues, 1);
        assert_eq!(cfg.recon.penalties.vendor_mismatch, 5.0);
        assert_eq!(cfg.recon.penalties.customer_mismatch, 50.0);
        assert_eq!(cfg.server.port, 8080);
    }
}
