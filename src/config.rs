use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub owner: String,
    pub beneficiary: String,
    pub prize_token: String,
    pub booster_address: String,
    pub period_quantized: bool,
    pub twab_oracle_url: Option<String>,
    pub twab_period_seconds: u64,
    pub twab_average_supply: u128,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let owner = env_map
            .get("OWNER")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("OWNER".to_string()))?;

        let beneficiary = env_map
            .get("BENEFICIARY")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("BENEFICIARY".to_string()))?;

        let prize_token = env_map
            .get("PRIZE_TOKEN")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("PRIZE_TOKEN".to_string()))?;

        let booster_address = env_map
            .get("BOOSTER_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "booster".to_string());

        let period_quantized = match env_map
            .get("PERIOD_QUANTIZED")
            .map(|s| s.as_str())
            .unwrap_or("false")
        {
            "true" => true,
            "false" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "PERIOD_QUANTIZED".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        let twab_oracle_url = env_map.get("TWAB_ORACLE_URL").cloned();

        let twab_period_seconds = env_map
            .get("TWAB_PERIOD_SECONDS")
            .map(|s| s.as_str())
            .unwrap_or("86400")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "TWAB_PERIOD_SECONDS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let twab_average_supply = env_map
            .get("TWAB_AVERAGE_SUPPLY")
            .map(|s| s.as_str())
            .unwrap_or("0")
            .parse::<u128>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "TWAB_AVERAGE_SUPPLY".to_string(),
                    "must be a valid u128".to_string(),
                )
            })?;

        Ok(Config {
            port,
            owner,
            beneficiary,
            prize_token,
            booster_address,
            period_quantized,
            twab_oracle_url,
            twab_period_seconds,
            twab_average_supply,
        })
    }
}
