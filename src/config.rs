use std::env;

/// Engine configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub ledger_store_url: String,
    pub master_data_url: String,
    pub request_timeout_secs: u64,
    pub balance_write_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let ledger_store_url = env::var("LEDGER_STORE_URL")
            .map_err(|_| "LEDGER_STORE_URL must be set".to_string())?;

        let master_data_url = env::var("MASTER_DATA_URL")
            .map_err(|_| "MASTER_DATA_URL must be set".to_string())?;

        let request_timeout_secs: u64 = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| "REQUEST_TIMEOUT_SECS must be a valid u64".to_string())?;

        let balance_write_attempts: u32 = env::var("BALANCE_WRITE_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .map_err(|_| "BALANCE_WRITE_ATTEMPTS must be a valid u32".to_string())?;

        Ok(Config {
            ledger_store_url,
            master_data_url,
            request_timeout_secs,
            balance_write_attempts,
        })
    }
}
