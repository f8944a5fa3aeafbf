use std::env;

use config_crate::{Config as RawConfig, ConfigError, Environment, File};

enum Env {
    Development,
    Test,
    Production,
}

impl Env {
    fn new() -> Self {
        match env::var("RUN_MODE") {
            Ok(ref s) if s == "test" => Env::Test,
            Ok(ref s) if s == "production" => Env::Production,
            _ => Env::Development,
        }
    }

    fn to_string(&self) -> &'static str {
        match self {
            &Env::Development => "development",
            &Env::Production => "production",
            &Env::Test => "test",
        }
    }
}

/// Retail storefront rules
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct B2c {
    /// Delivery is free when the subtotal is strictly above this value
    pub free_delivery_above: f64,
    pub delivery_charge: f64,
    pub min_order_value: f64,
    /// Upper bound for a single add-to-cart request
    pub max_quantity_per_add: u32,
    pub cart_ttl_minutes: i64,
}

impl Default for B2c {
    fn default() -> Self {
        Self {
            free_delivery_above: 149.0,
            delivery_charge: 25.0,
            min_order_value: 99.0,
            max_quantity_per_add: 10,
            cart_ttl_minutes: 30,
        }
    }
}

/// Wholesale account rules
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct B2b {
    pub min_order_value: f64,
    pub free_delivery_above: f64,
    pub reduced_delivery_from: f64,
    pub reduced_delivery_charge: f64,
    pub standard_delivery_charge: f64,
    pub gst_rate: f64,
    pub min_schedule_lead_hours: i64,
    pub cart_ttl_hours: i64,
}

impl Default for B2b {
    fn default() -> Self {
        Self {
            min_order_value: 5000.0,
            free_delivery_above: 25000.0,
            reduced_delivery_from: 10000.0,
            reduced_delivery_charge: 500.0,
            standard_delivery_charge: 1000.0,
            gst_rate: 0.18,
            min_schedule_lead_hours: 24,
            cart_ttl_hours: 24,
        }
    }
}

/// Bounds an administrator may grant when approving a business
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credit {
    pub min_limit: f64,
    pub max_limit: f64,
    pub allowed_periods: Vec<u32>,
}

impl Default for Credit {
    fn default() -> Self {
        Self {
            min_limit: 10000.0,
            max_limit: 500000.0,
            allowed_periods: vec![7, 15, 30],
        }
    }
}

/// Default split of freshly created stock between the two channels
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stock {
    pub b2c_share: f64,
    pub b2b_share: f64,
}

impl Default for Stock {
    fn default() -> Self {
        Self {
            b2c_share: 0.3,
            b2b_share: 0.7,
        }
    }
}

/// Service configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub b2c: B2c,
    pub b2b: B2b,
    pub credit: Credit,
    pub stock: Stock,
}

impl Config {
    /// Creates config from base.toml, which are overwritten by <env>.toml, where
    /// env is one of development, test, production. After that it could be overwritten
    /// by env variables like GROCERY_B2C (this will override `b2c` field in config)
    pub fn new() -> Result<Self, ConfigError> {
        let env = Env::new();
        let mut s = RawConfig::new();

        s.merge(File::with_name("config/base"))?;
        // Optional file specific for environment
        s.merge(File::with_name(&format!("config/{}", env.to_string())).required(false))?;

        // Add in settings from the environment (with a prefix of GROCERY)
        s.merge(Environment::with_prefix("GROCERY"))?;

        s.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_file_matches_defaults() {
        let config = Config::new().unwrap();
        let defaults = Config::default();

        assert_eq!(config.b2b, defaults.b2b);
        assert_eq!(config.credit, defaults.credit);
        assert_eq!(config.stock, defaults.stock);
        assert_eq!(config.b2c.free_delivery_above, defaults.b2c.free_delivery_above);
        assert_eq!(config.b2c.min_order_value, defaults.b2c.min_order_value);
    }
}
