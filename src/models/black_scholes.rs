use crate::errors::EngineError;
use crate::models::d1d2::D1D2;

/// European option side. Each variant is also the pricing strategy used by
/// an engine instance, chosen once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Black-Scholes price from precomputed d1/d2 and their CDF terms.
    ///
    /// Call = S*N(d1) - K*e^(-rT)*N(d2)
    /// Put  = K*e^(-rT)*N(-d2) - S*N(-d1), with N(-d) = 1 - N(d)
    #[inline]
    pub fn price(&self, asset_price: f64, strike_price: f64, risk_free_rate: f64, d: &D1D2) -> f64 {
        let discounted_strike = strike_price * (-risk_free_rate * d.years_to_expiry).exp();
        match self {
            OptionType::Call => asset_price * d.n_d1 - discounted_strike * d.n_d2,
            OptionType::Put => discounted_strike * (1.0 - d.n_d2) - asset_price * (1.0 - d.n_d1),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "Call",
            OptionType::Put => "Put",
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OptionType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Call" => Ok(OptionType::Call),
            "Put" => Ok(OptionType::Put),
            other => Err(EngineError::Configuration(other.to_string())),
        }
    }
}

/// One grid cell of an option chain. Strike and days are echoed from the
/// inputs that produced the price.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionPosition {
    pub price: f64,
    pub strike: f64,
    pub days_to_expiry: f64,
}
