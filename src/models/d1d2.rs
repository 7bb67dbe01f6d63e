use crate::errors::{EngineError, EngineResult};
use crate::models::normal::norm_cdf;
use std::collections::HashMap;

const DAYS_PER_YEAR: f64 = 365.0;

/// Black-Scholes intermediate terms for one (asset, strike, days) point.
/// `n_d1`/`n_d2` are N(d1) and N(d2), so a cached entry prices without
/// touching the normal CDF again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct D1D2 {
    pub d1: f64,
    pub d2: f64,
    pub n_d1: f64,
    pub n_d2: f64,
    pub years_to_expiry: f64,
}

/// d1/d2 calculator specialized for one days-to-expiry value.
///
/// `drift` and `vol_adj` depend only on the days (and the engine's fixed
/// volatility and rate), so they are computed once and reused for every
/// (asset, strike) pair sharing that expiry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct D1D2Factory {
    years_to_expiry: f64,
    drift: f64,
    vol_adj: f64,
}

impl D1D2Factory {
    /// Fails when `volatility * sqrt(years)` is zero (zero vol or zero time).
    pub fn new(days_to_expiry: f64, volatility: f64, risk_free_rate: f64) -> EngineResult<Self> {
        let years_to_expiry = days_to_expiry / DAYS_PER_YEAR;
        let sqrt_t = years_to_expiry.sqrt();
        let drift = (risk_free_rate + volatility * volatility / 2.0) * years_to_expiry;
        let vol_adj = volatility * sqrt_t;

        if vol_adj == 0.0 {
            return Err(EngineError::DegenerateInput {
                rate: risk_free_rate,
                volatility,
                days: days_to_expiry,
                years: years_to_expiry,
            });
        }

        Ok(Self {
            years_to_expiry,
            drift,
            vol_adj,
        })
    }

    #[inline]
    pub fn vol_adj(&self) -> f64 {
        self.vol_adj
    }

    /// Pure evaluation. Non-positive prices make `ln` return NaN, which is
    /// reported instead of priced. The CDF terms are only computed on success.
    pub fn evaluate(&self, asset_price: f64, strike_price: f64) -> EngineResult<D1D2> {
        let d1 = ((asset_price / strike_price).ln() + self.drift) / self.vol_adj;
        let d2 = d1 - self.vol_adj;

        if d1.is_nan() || d2.is_nan() {
            return Err(EngineError::NumericDomain {
                d1,
                d2,
                asset_price,
                strike_price,
                vol_adj: self.vol_adj,
            });
        }

        Ok(D1D2 {
            d1,
            d2,
            n_d1: norm_cdf(d1),
            n_d2: norm_cdf(d2),
            years_to_expiry: self.years_to_expiry,
        })
    }
}

/// Exact cache key. Equality is bitwise: every component comes from the same
/// deterministic span arithmetic, so no tolerance is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PriceKey {
    asset_price: u64,
    strike_price: u64,
    days_to_expiry: u64,
}

impl PriceKey {
    #[inline]
    fn new(asset_price: f64, strike_price: f64, days_to_expiry: f64) -> Self {
        Self {
            asset_price: asset_price.to_bits(),
            strike_price: strike_price.to_bits(),
            days_to_expiry: days_to_expiry.to_bits(),
        }
    }
}

/// Memoization counters for one cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub value_hits: u64,
    pub value_misses: u64,
    pub factory_builds: u64,
}

/// Two-level d1/d2 cache: factories keyed by days-to-expiry, results keyed
/// by the full (asset, strike, days) triple.
///
/// Owned by a single engine instance and dropped with it. Entries are never
/// evicted; the grid that fills the cache is finite.
#[derive(Debug)]
pub struct D1D2Cache {
    volatility: f64,
    risk_free_rate: f64,
    factories: HashMap<u64, D1D2Factory>,
    values: HashMap<PriceKey, D1D2>,
    stats: CacheStats,
}

impl D1D2Cache {
    pub fn new(volatility: f64, risk_free_rate: f64) -> Self {
        Self {
            volatility,
            risk_free_rate,
            factories: HashMap::new(),
            values: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Cached d1/d2 for a grid point, computing and storing it on a miss.
    /// Failed factory builds and failed evaluations are never stored.
    pub fn get(
        &mut self,
        asset_price: f64,
        strike_price: f64,
        days_to_expiry: f64,
    ) -> EngineResult<D1D2> {
        let key = PriceKey::new(asset_price, strike_price, days_to_expiry);
        if let Some(hit) = self.values.get(&key) {
            self.stats.value_hits += 1;
            return Ok(*hit);
        }
        self.stats.value_misses += 1;

        let factory = self.factory(days_to_expiry)?;
        let d1d2 = factory.evaluate(asset_price, strike_price)?;
        self.values.insert(key, d1d2);
        Ok(d1d2)
    }

    fn factory(&mut self, days_to_expiry: f64) -> EngineResult<D1D2Factory> {
        let day_key = days_to_expiry.to_bits();
        if let Some(factory) = self.factories.get(&day_key) {
            return Ok(*factory);
        }

        let factory = D1D2Factory::new(days_to_expiry, self.volatility, self.risk_free_rate)?;
        self.stats.factory_builds += 1;
        self.factories.insert(day_key, factory);
        Ok(factory)
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d1_minus_d2_is_vol_adjustment() {
        let vol = 0.2;
        for days in [1.0, 7.5, 30.0, 365.0] {
            let factory = D1D2Factory::new(days, vol, 0.05).unwrap();
            let r = factory.evaluate(105.0, 100.0).unwrap();
            let expected = vol * (days / 365.0_f64).sqrt();
            assert!((r.d1 - r.d2 - expected).abs() < 1e-12, "days={days}");
            assert_eq!(factory.vol_adj(), expected);
        }
    }

    #[test]
    fn test_known_values() {
        // S=K=100, 365 days, vol=0.2, r=0.05: d1 = 0.35, d2 = 0.15
        let r = D1D2Factory::new(365.0, 0.2, 0.05)
            .unwrap()
            .evaluate(100.0, 100.0)
            .unwrap();
        assert!((r.d1 - 0.35).abs() < 1e-12);
        assert!((r.d2 - 0.15).abs() < 1e-12);
        assert_eq!(r.n_d1, norm_cdf(r.d1));
        assert_eq!(r.n_d2, norm_cdf(r.d2));
        assert_eq!(r.years_to_expiry, 1.0);
    }

    #[test]
    fn test_zero_vol_or_time_is_degenerate() {
        assert!(matches!(
            D1D2Factory::new(30.0, 0.0, 0.05),
            Err(EngineError::DegenerateInput { .. })
        ));
        assert!(matches!(
            D1D2Factory::new(0.0, 0.2, 0.05),
            Err(EngineError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn test_non_positive_prices_are_numeric_domain_errors() {
        let factory = D1D2Factory::new(30.0, 0.2, 0.05).unwrap();
        assert!(matches!(
            factory.evaluate(-1.0, 100.0),
            Err(EngineError::NumericDomain { .. })
        ));
        assert!(matches!(
            factory.evaluate(0.0, 0.0),
            Err(EngineError::NumericDomain { .. })
        ));
    }

    #[test]
    fn test_repeat_lookup_is_memoized() {
        let mut cache = D1D2Cache::new(0.2, 0.05);
        let first = cache.get(100.0, 95.0, 30.0).unwrap();
        let after_first = cache.stats();
        assert_eq!(after_first.value_misses, 1);
        assert_eq!(after_first.factory_builds, 1);

        let second = cache.get(100.0, 95.0, 30.0).unwrap();
        assert_eq!(first.d1.to_bits(), second.d1.to_bits());
        assert_eq!(first.d2.to_bits(), second.d2.to_bits());
        assert_eq!(first.n_d1.to_bits(), second.n_d1.to_bits());

        let after_second = cache.stats();
        assert_eq!(after_second.value_hits, 1);
        assert_eq!(after_second.value_misses, 1);
        assert_eq!(after_second.factory_builds, 1);
    }

    #[test]
    fn test_factory_shared_across_prices_with_same_days() {
        let mut cache = D1D2Cache::new(0.2, 0.05);
        for strike in [90.0, 95.0, 100.0, 105.0] {
            cache.get(100.0, strike, 30.0).unwrap();
        }
        cache.get(100.0, 100.0, 60.0).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.factory_builds, 2);
        assert_eq!(stats.value_misses, 5);
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let mut cache = D1D2Cache::new(0.0, 0.05);
        assert!(cache.get(100.0, 100.0, 30.0).is_err());
        assert!(cache.get(100.0, 100.0, 30.0).is_err());
        assert_eq!(cache.stats().factory_builds, 0);
        assert!(cache.is_empty());

        let mut cache = D1D2Cache::new(0.2, 0.05);
        assert!(cache.get(0.0, 0.0, 30.0).is_err());
        assert!(cache.is_empty());
        // The factory itself was fine and stays cached
        assert_eq!(cache.stats().factory_builds, 1);
    }
}
