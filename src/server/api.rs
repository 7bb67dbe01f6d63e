//! Request/response shapes for `GET /optionChain` and the glue between a
//! bound query and one engine instance.

use crate::errors::{EngineError, EngineResult};
use crate::models::d1d2::CacheStats;
use crate::models::{ChainPlan, OptionChain, OptionChainCalculator, ValueSpan};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Raw query parameters. Missing or unparsable fields are rejected by the
/// extractor before [`OptionChainQuery::validate`] runs.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChainQuery {
    pub asset_name: String,
    pub option_type: String,
    pub asset_price_low: f64,
    pub asset_price_high: f64,
    pub asset_price_step: f64,
    pub strike_price_low: f64,
    pub strike_price_high: f64,
    pub strike_price_step: f64,
    pub days_to_expiry_low: f64,
    pub days_to_expiry_high: f64,
    pub days_to_expiry_step: f64,
    pub risk_free_rate: f64,
    pub volatility: f64,
}

impl OptionChainQuery {
    /// Request-level checks: name shape, option type, positive inputs and
    /// strictly increasing ranges. Span rules proper are the engine's.
    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |msg: String| -> EngineResult<()> { Err(EngineError::InvalidRequest(msg)) };

        if self.asset_name.chars().count() < 2 {
            return invalid("assetName must be at least 2 characters".into());
        }
        if !self.asset_name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return invalid("assetName must be alphanumeric".into());
        }
        if self.option_type != "Call" && self.option_type != "Put" {
            return invalid(format!("optionType must be one of Call Put, got {:?}", self.option_type));
        }

        let positives = [
            ("assetPriceLow", self.asset_price_low),
            ("assetPriceStep", self.asset_price_step),
            ("strikePriceLow", self.strike_price_low),
            ("strikePriceStep", self.strike_price_step),
            ("daysToExpiryLow", self.days_to_expiry_low),
            ("daysToExpiryStep", self.days_to_expiry_step),
            ("riskFreeRate", self.risk_free_rate),
            ("volatility", self.volatility),
        ];
        // `!(v > 0)` also rejects NaN
        if let Some((name, _)) = positives.iter().find(|(_, v)| !(*v > 0.0)) {
            return invalid(format!("{name} must be > 0"));
        }

        let ranges = [
            ("assetPriceHigh", "assetPriceLow", self.asset_price_high, self.asset_price_low),
            ("strikePriceHigh", "strikePriceLow", self.strike_price_high, self.strike_price_low),
            ("daysToExpiryHigh", "daysToExpiryLow", self.days_to_expiry_high, self.days_to_expiry_low),
        ];
        if let Some((high, low, _, _)) = ranges.iter().find(|(_, _, h, l)| !(h > l)) {
            return invalid(format!("{high} must be greater than {low}"));
        }

        Ok(())
    }

    pub fn asset_price_span(&self) -> ValueSpan {
        ValueSpan::new(self.asset_price_low, self.asset_price_high, self.asset_price_step)
    }

    pub fn strike_price_span(&self) -> ValueSpan {
        ValueSpan::new(self.strike_price_low, self.strike_price_high, self.strike_price_step)
    }

    pub fn days_to_expiry_span(&self) -> ValueSpan {
        ValueSpan::new(self.days_to_expiry_low, self.days_to_expiry_high, self.days_to_expiry_step)
    }

    fn to_request(&self) -> OptionChainRequest {
        OptionChainRequest {
            option_type: self.option_type.clone(),
            asset_price_low: self.asset_price_low,
            asset_price_high: self.asset_price_high,
            asset_price_step: self.asset_price_step,
            strike_price_low: self.strike_price_low,
            strike_price_high: self.strike_price_high,
            strike_price_step: self.strike_price_step,
            days_to_expiry_low: self.days_to_expiry_low,
            days_to_expiry_high: self.days_to_expiry_high,
            days_to_expiry_step: self.days_to_expiry_step,
            risk_free_rate: self.risk_free_rate,
            volatility: self.volatility,
        }
    }
}

/// Echo of the pricing inputs in the response.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChainRequest {
    pub option_type: String,
    pub asset_price_low: f64,
    pub asset_price_high: f64,
    pub asset_price_step: f64,
    pub strike_price_low: f64,
    pub strike_price_high: f64,
    pub strike_price_step: f64,
    pub days_to_expiry_low: f64,
    pub days_to_expiry_high: f64,
    pub days_to_expiry_step: f64,
    pub risk_free_rate: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryPrice {
    pub days_to_expiry: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeExpiryPrice {
    pub strike_price: f64,
    pub expiry_prices: Vec<ExpiryPrice>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetStrikeExpiryPrice {
    pub asset_price: f64,
    pub strike_expiry_prices: Vec<StrikeExpiryPrice>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChainResponse {
    pub asset_name: String,
    pub request: OptionChainRequest,
    pub values: Vec<AssetStrikeExpiryPrice>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// A served chain plus what it cost, for logging and counters.
#[derive(Debug)]
pub struct ChainOutcome {
    pub response: OptionChainResponse,
    pub grid_points: usize,
    pub cache: CacheStats,
}

/// Validate the query, build a fresh engine, guard the grid size and price.
/// CPU-bound: call from a blocking context.
pub fn option_chain(
    query: &OptionChainQuery,
    max_grid_points: usize,
    price_decimals: u32,
) -> EngineResult<ChainOutcome> {
    query.validate()?;

    let mut calculator = OptionChainCalculator::from_name(
        &query.option_type,
        query.volatility,
        query.risk_free_rate,
        query.days_to_expiry_high,
    )?;

    let plan = calculator.plan(
        &query.asset_price_span(),
        &query.strike_price_span(),
        &query.days_to_expiry_span(),
    )?;

    let grid_points = plan.grid_points();
    if grid_points > max_grid_points {
        return Err(EngineError::GridTooLarge {
            points: grid_points,
            limit: max_grid_points,
        });
    }

    let chain = calculator.price_plan(&plan)?;

    Ok(ChainOutcome {
        response: OptionChainResponse {
            asset_name: query.asset_name.clone(),
            request: query.to_request(),
            values: shape_values(&plan, chain, price_decimals),
            generated_at: chrono::Utc::now(),
        },
        grid_points,
        cache: calculator.cache_stats(),
    })
}

/// Label each level with the value that produced it. Strikes come from the
/// plan so they survive an empty days dimension.
fn shape_values(plan: &ChainPlan, chain: OptionChain, price_decimals: u32) -> Vec<AssetStrikeExpiryPrice> {
    plan.asset_prices
        .ascending()
        .zip(chain)
        .map(|(asset_price, per_asset)| AssetStrikeExpiryPrice {
            asset_price,
            strike_expiry_prices: plan
                .strike_prices
                .ascending()
                .zip(per_asset)
                .map(|(strike_price, per_strike)| StrikeExpiryPrice {
                    strike_price,
                    expiry_prices: per_strike
                        .into_iter()
                        .map(|p| ExpiryPrice {
                            days_to_expiry: p.days_to_expiry,
                            price: round_price(p.price, price_decimals),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

/// Round half away from zero for display. Values with no decimal
/// representation (non-finite) pass through unchanged.
pub fn round_price(value: f64, places: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> OptionChainQuery {
        OptionChainQuery {
            asset_name: "ACME".into(),
            option_type: "Call".into(),
            asset_price_low: 95.0,
            asset_price_high: 105.0,
            asset_price_step: 5.0,
            strike_price_low: 100.0,
            strike_price_high: 110.0,
            strike_price_step: 10.0,
            days_to_expiry_low: 30.0,
            days_to_expiry_high: 60.0,
            days_to_expiry_step: 30.0,
            risk_free_rate: 0.05,
            volatility: 0.2,
        }
    }

    fn invalid_message(q: &OptionChainQuery) -> String {
        match q.validate() {
            Err(EngineError::InvalidRequest(msg)) => msg,
            other => panic!("expected invalid request, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_query_passes() {
        assert!(query().validate().is_ok());
    }

    #[test]
    fn test_asset_name_rules() {
        let mut q = query();
        q.asset_name = "A".into();
        assert!(invalid_message(&q).contains("at least 2"));
        q.asset_name = "AC-ME".into();
        assert!(invalid_message(&q).contains("alphanumeric"));
    }

    #[test]
    fn test_option_type_rule() {
        let mut q = query();
        q.option_type = "Straddle".into();
        assert!(invalid_message(&q).starts_with("optionType"));
    }

    #[test]
    fn test_non_positive_inputs() {
        let mut q = query();
        q.volatility = 0.0;
        assert_eq!(invalid_message(&q), "volatility must be > 0");

        let mut q = query();
        q.strike_price_step = f64::NAN;
        assert_eq!(invalid_message(&q), "strikePriceStep must be > 0");
    }

    #[test]
    fn test_high_must_exceed_low() {
        let mut q = query();
        q.days_to_expiry_high = 30.0;
        assert_eq!(invalid_message(&q), "daysToExpiryHigh must be greater than daysToExpiryLow");
    }

    #[test]
    fn test_response_nesting_and_rounding() {
        let outcome = option_chain(&query(), 1000, 2).unwrap();
        assert_eq!(outcome.grid_points, 3 * 2 * 2);

        let values = &outcome.response.values;
        let assets: Vec<f64> = values.iter().map(|a| a.asset_price).collect();
        assert_eq!(assets, vec![95.0, 100.0, 105.0]);

        let atm = &values[1].strike_expiry_prices[0];
        assert_eq!(atm.strike_price, 100.0);
        let days: Vec<f64> = atm.expiry_prices.iter().map(|e| e.days_to_expiry).collect();
        assert_eq!(days, vec![60.0, 30.0]);
        // 30-day ATM call at vol 0.2, r 0.05 is 2.4934 before rounding
        assert!((atm.expiry_prices[1].price - 2.49).abs() < 1e-12);

        assert_eq!(outcome.response.request.days_to_expiry_high, 60.0);
        assert_eq!(outcome.cache.value_misses, 12);
        assert_eq!(outcome.cache.factory_builds, 2);
    }

    #[test]
    fn test_grid_limit() {
        let err = option_chain(&query(), 11, 2).unwrap_err();
        assert!(matches!(err, EngineError::GridTooLarge { points: 12, limit: 11 }));
    }

    #[test]
    fn test_engine_validation_surfaces() {
        let mut q = query();
        q.strike_price_step = 0.1;
        let err = option_chain(&q, 1000, 2).unwrap_err();
        assert!(matches!(err, EngineError::Validation { span: "strikePriceRange", .. }));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_unrepresentable_span_is_rejected_not_emptied() {
        let mut q = query();
        q.asset_price_low = 0.25;
        q.asset_price_high = 1e300;
        q.asset_price_step = 0.25;
        let err = option_chain(&q, usize::MAX, 2).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation {
                span: "assetPriceRange",
                reason: crate::errors::SpanFault::TooManyPoints
            }
        ));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_round_price() {
        assert!((round_price(2.493_376_819, 2) - 2.49).abs() < 1e-12);
        assert!((round_price(0.125, 2) - 0.13).abs() < 1e-12);
        assert!((round_price(-0.125, 2) + 0.13).abs() < 1e-12);
        assert!((round_price(10.450_583_572, 4) - 10.4506).abs() < 1e-12);
        assert!(round_price(f64::NAN, 2).is_nan());
    }
}
