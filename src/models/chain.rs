//! Option chain assembly: validates the three spans, walks the grid
//! (asset asc, strike asc, days desc) and prices every point through the
//! instance's d1/d2 cache.

use crate::errors::EngineResult;
use crate::models::black_scholes::{OptionPosition, OptionType};
use crate::models::d1d2::{CacheStats, D1D2Cache};
use crate::models::span::{validate_span, ValidatedSpan, ValueSpan};

pub const ASSET_PRICE_RANGE: &str = "assetPriceRange";
pub const STRIKE_PRICE_RANGE: &str = "strikePriceRange";
pub const DAYS_TO_EXPIRY_RANGE: &str = "daysToExpiryRange";

/// Asset price (asc) -> strike price (asc) -> days to expiry (desc).
pub type OptionChain = Vec<Vec<Vec<OptionPosition>>>;

/// Validated grid, ready to price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainPlan {
    pub asset_prices: ValidatedSpan,
    pub strike_prices: ValidatedSpan,
    pub days_to_expiry: ValidatedSpan,
}

impl ChainPlan {
    /// Total number of points that pricing will visit.
    pub fn grid_points(&self) -> usize {
        self.asset_prices
            .len()
            .saturating_mul(self.strike_prices.len())
            .saturating_mul(self.days_to_expiry.len())
    }
}

/// Pricing engine for one request. Owns its d1/d2 cache; never share an
/// instance between concurrent callers.
#[derive(Debug)]
pub struct OptionChainCalculator {
    option_type: OptionType,
    volatility: f64,
    risk_free_rate: f64,
    expiry_in_days: f64,
    cache: D1D2Cache,
}

impl OptionChainCalculator {
    pub fn new(
        option_type: OptionType,
        volatility: f64,
        risk_free_rate: f64,
        expiry_in_days: f64,
    ) -> Self {
        Self {
            option_type,
            volatility,
            risk_free_rate,
            expiry_in_days,
            cache: D1D2Cache::new(volatility, risk_free_rate),
        }
    }

    /// Construct from an option type name. Unknown names fail here, before
    /// any span is looked at.
    pub fn from_name(
        option_type: &str,
        volatility: f64,
        risk_free_rate: f64,
        expiry_in_days: f64,
    ) -> EngineResult<Self> {
        let option_type = option_type.parse::<OptionType>()?;
        Ok(Self::new(option_type, volatility, risk_free_rate, expiry_in_days))
    }

    #[inline]
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    #[inline]
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Nominal expiry; retained for callers, not used by the grid walk.
    #[inline]
    pub fn expiry_in_days(&self) -> f64 {
        self.expiry_in_days
    }

    #[inline]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Validate the three spans. A days span starting at exactly 0 is moved
    /// up one step: the formula is undefined at zero time to expiry.
    pub fn plan(
        &self,
        asset_price_span: &ValueSpan,
        strike_price_span: &ValueSpan,
        days_to_expiry_span: &ValueSpan,
    ) -> EngineResult<ChainPlan> {
        let asset_prices = validate_span(ASSET_PRICE_RANGE, asset_price_span)?;
        let strike_prices = validate_span(STRIKE_PRICE_RANGE, strike_price_span)?;
        let mut days_to_expiry = validate_span(DAYS_TO_EXPIRY_RANGE, days_to_expiry_span)?;
        if days_to_expiry.low() == 0.0 {
            days_to_expiry = days_to_expiry.raise_low();
        }

        Ok(ChainPlan {
            asset_prices,
            strike_prices,
            days_to_expiry,
        })
    }

    /// Price a single grid point with the instance's option type.
    pub fn price_at(
        &mut self,
        asset_price: f64,
        strike_price: f64,
        days_to_expiry: f64,
    ) -> EngineResult<OptionPosition> {
        let d1d2 = self.cache.get(asset_price, strike_price, days_to_expiry)?;
        let price = self
            .option_type
            .price(asset_price, strike_price, self.risk_free_rate, &d1d2);

        Ok(OptionPosition {
            price,
            strike: strike_price,
            days_to_expiry,
        })
    }

    /// Walk a validated plan. The first pricing failure aborts the walk and
    /// nothing computed so far is returned.
    ///
    /// Rows grow as they are priced; span lengths are not trusted as
    /// allocation sizes.
    pub fn price_plan(&mut self, plan: &ChainPlan) -> EngineResult<OptionChain> {
        let mut chain: OptionChain = Vec::new();

        for asset_price in plan.asset_prices.ascending() {
            let mut per_asset = Vec::new();
            for strike_price in plan.strike_prices.ascending() {
                let per_strike = plan
                    .days_to_expiry
                    .descending()
                    .map(|days| self.price_at(asset_price, strike_price, days))
                    .collect::<EngineResult<Vec<_>>>()?;
                per_asset.push(per_strike);
            }
            chain.push(per_asset);
        }

        tracing::debug!(
            option_type = %self.option_type,
            grid_points = plan.grid_points(),
            cache = ?self.cache.stats(),
            "option chain computed"
        );
        Ok(chain)
    }

    /// Validate, then price the full grid.
    pub fn compute_option_chain(
        &mut self,
        asset_price_span: &ValueSpan,
        strike_price_span: &ValueSpan,
        days_to_expiry_span: &ValueSpan,
    ) -> EngineResult<OptionChain> {
        let plan = self.plan(asset_price_span, strike_price_span, days_to_expiry_span)?;
        self.price_plan(&plan)
    }
}
