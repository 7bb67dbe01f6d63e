use statrs::function::erf::erf;
use std::f64::consts::SQRT_2;

/// Standard normal CDF, `0.5 * (1 + erf(x / sqrt 2))`.
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    #[cfg(test)]
    CDF_CALLS.with(|calls| calls.set(calls.get() + 1));
    0.5 * (1.0 + erf(x / SQRT_2))
}

#[cfg(test)]
thread_local! {
    static CDF_CALLS: std::cell::Cell<u64> = const { std::cell::Cell::new(0) };
}

/// Number of `norm_cdf` evaluations on the current thread.
#[cfg(test)]
pub(crate) fn cdf_calls() -> u64 {
    CDF_CALLS.with(|calls| calls.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        let cases = [
            (0.0, 0.5),
            (1.0, 0.841_344_746_068_542_9),
            (-1.0, 0.158_655_253_931_457_07),
            (1.96, 0.975_002_104_851_779_5),
            (3.0, 0.998_650_101_968_369_9),
            (-5.0, 2.866_515_718_791_939e-7),
        ];
        for (x, expected) in cases {
            let got = norm_cdf(x);
            assert!((got - expected).abs() < 1e-9, "N({x}) = {got}, want {expected}");
        }
    }

    #[test]
    fn test_symmetry() {
        for i in -40..=40 {
            let x = i as f64 * 0.25;
            assert!((norm_cdf(x) + norm_cdf(-x) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_saturates_in_tails() {
        assert!(norm_cdf(-9.5) >= 0.0 && norm_cdf(-9.5) < 1e-15);
        assert!((norm_cdf(9.5) - 1.0).abs() < 1e-15);
    }
}
