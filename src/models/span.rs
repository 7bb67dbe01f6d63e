use crate::errors::{EngineError, EngineResult, SpanFault};

/// Inclusive numeric range walked with a fixed increment.
/// Prices, strikes and day counts are quoted in quarter units.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValueSpan {
    pub low: f64,
    pub high: f64,
    pub step: f64,
}

impl ValueSpan {
    pub fn new(low: f64, high: f64, step: f64) -> Self {
        Self { low, high, step }
    }

    /// Single-point span (`step == 0`, `low == high`).
    pub fn point(value: f64) -> Self {
        Self::new(value, value, 0.0)
    }
}

/// A span that passed [`validate_span`], with its exact number of grid points.
///
/// Values are produced as `low + i * step` (or `high - i * step`), never by
/// repeated addition, so the point count cannot drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedSpan {
    low: f64,
    high: f64,
    step: f64,
    count: usize,
}

impl ValidatedSpan {
    #[inline]
    pub fn low(&self) -> f64 {
        self.low
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `low, low + step, ...` up to and including `high` when reachable.
    pub fn ascending(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(move |i| self.low + i as f64 * self.step)
    }

    /// `high, high - step, ...` down to and including `low` when reachable.
    pub fn descending(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(move |i| self.high - i as f64 * self.step)
    }

    /// Same span with `low` moved up by one step. The point count is
    /// recomputed and may drop to zero.
    pub fn raise_low(&self) -> Self {
        let low = self.low + self.step;
        Self {
            low,
            // The range only shrinks, so the count stays representable
            count: point_count(low, self.high, self.step).unwrap_or(0),
            ..*self
        }
    }
}

/// `floor((high - low) / step) + 1`; a zero step is a single point.
/// `None` when the count does not fit in a `usize`.
fn point_count(low: f64, high: f64, step: f64) -> Option<usize> {
    if low > high {
        return Some(0);
    }
    if step == 0.0 {
        return Some(1);
    }
    let intervals = ((high - low) / step).floor();
    // `usize::MAX as f64` rounds up to 2^64; anything below it casts exactly
    if !(intervals < usize::MAX as f64) {
        return None;
    }
    (intervals as usize).checked_add(1)
}

#[inline]
fn is_quarter_multiple(value: f64) -> bool {
    // NaN and infinities yield a NaN fraction and fail here.
    (value * 4.0).fract() == 0.0
}

/// Validate a span before it drives a loop. Checks run in order and the
/// first failure wins:
///
/// 1. negative low or high
/// 2. low above high
/// 3. non-positive step, except `step == 0` with `low == high` (single point)
/// 4. any of low/high/step not a multiple of 0.25
/// 5. a point count that does not fit in a `usize`
///
/// A step wider than the range is accepted and yields one point.
pub fn validate_span(name: &'static str, span: &ValueSpan) -> EngineResult<ValidatedSpan> {
    let fault = if span.low < 0.0 || span.high < 0.0 {
        Some(SpanFault::Negative)
    } else if span.low > span.high {
        Some(SpanFault::LowAboveHigh)
    } else if span.step < 0.0 || (span.step == 0.0 && span.high != span.low) {
        Some(SpanFault::NonPositiveStep)
    } else if ![span.low, span.high, span.step]
        .into_iter()
        .all(is_quarter_multiple)
    {
        Some(SpanFault::NotQuarterMultiple)
    } else {
        None
    };

    let count = match fault {
        Some(reason) => Err(reason),
        None => point_count(span.low, span.high, span.step).ok_or(SpanFault::TooManyPoints),
    }
    .map_err(|reason| EngineError::Validation { span: name, reason })?;

    Ok(ValidatedSpan {
        low: span.low,
        high: span.high,
        step: span.step,
        count,
    })
}
