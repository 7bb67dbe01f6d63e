use crate::errors::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    /// Upper bound on asset x strike x days points per request
    pub max_grid_points: usize,
    /// Decimal places applied to prices in responses
    pub price_decimals: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            max_grid_points: 250_000,
            price_decimals: 2,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let server_port = var_or("SERVER_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| EngineError::Config(format!("SERVER_PORT: {e}")))?;

        let max_grid_points = var_or("MAX_GRID_POINTS", "250000")
            .parse::<usize>()
            .map_err(|e| EngineError::Config(format!("MAX_GRID_POINTS: {e}")))?;
        if max_grid_points == 0 {
            return Err(EngineError::Config("MAX_GRID_POINTS: must be > 0".into()));
        }

        let price_decimals = var_or("PRICE_DECIMALS", "2")
            .parse::<u32>()
            .map_err(|e| EngineError::Config(format!("PRICE_DECIMALS: {e}")))?;
        // rust_decimal supports at most 28 fractional digits
        if price_decimals > 28 {
            return Err(EngineError::Config("PRICE_DECIMALS: must be <= 28".into()));
        }

        Ok(Self {
            server_host: var_or("SERVER_HOST", "127.0.0.1"),
            server_port,
            max_grid_points,
            price_decimals,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
