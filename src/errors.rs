/// Domain-specific error types for the option chain engine.
/// Every failure is deterministic and input-driven. The engine must:
/// - Abort the whole computation on the first error (no partial grid)
/// - Never log or swallow an error; the request layer decides what to report
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{span}: {reason}")]
    Validation { span: &'static str, reason: SpanFault },

    #[error("unrecognized option type {0:?} - use Call or Put")]
    Configuration(String),

    #[error("volatility adjustment == 0.0, op = r/v/d/y = {rate}/{volatility}/{days}/{years}")]
    DegenerateInput {
        rate: f64,
        volatility: f64,
        days: f64,
        years: f64,
    },

    #[error("d1 or d2 is NaN, op = d1/d2/a/s/va = {d1}/{d2}/{asset_price}/{strike_price}/{vol_adj}")]
    NumericDomain {
        d1: f64,
        d2: f64,
        asset_price: f64,
        strike_price: f64,
        vol_adj: f64,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("grid of {points} points exceeds limit of {limit}")]
    GridTooLarge { points: usize, limit: usize },

    #[error("config error: {0}")]
    Config(String),
}

/// Why a value span was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SpanFault {
    #[error("range cannot be negative")]
    Negative,

    #[error("low greater than high")]
    LowAboveHigh,

    #[error("step must be positive")]
    NonPositiveStep,

    #[error("low, high, step must be multiples of 0.25")]
    NotQuarterMultiple,

    #[error("range has too many points")]
    TooManyPoints,
}

impl EngineError {
    /// True when the caller supplied bad input (maps to HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::Validation { .. }
                | EngineError::Configuration(_)
                | EngineError::InvalidRequest(_)
                | EngineError::GridTooLarge { .. }
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
