//! Cardinality-estimation hook.
//!
//! Operators expose one estimator per output. The plan graph only *carries*
//! these callbacks; whoever searches over alternatives invokes them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Estimated number of elements in a data set, as an interval plus the
/// probability that the true value lies within it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardinalityEstimate {
    lower: u64,
    upper: u64,
    correctness_prob: f64,
}

impl CardinalityEstimate {
    pub fn new(lower: u64, upper: u64, correctness_prob: f64) -> Self {
        Self {
            lower: lower.min(upper),
            upper: upper.max(lower),
            correctness_prob: correctness_prob.clamp(0.0, 1.0),
        }
    }

    /// A known, certain cardinality.
    pub fn exact(count: u64) -> Self {
        Self::new(count, count, 1.0)
    }

    pub fn lower(&self) -> u64 {
        self.lower
    }

    pub fn upper(&self) -> u64 {
        self.upper
    }

    pub fn correctness_prob(&self) -> f64 {
        self.correctness_prob
    }

    pub fn is_exact(&self) -> bool {
        self.lower == self.upper
    }

    /// Midpoint of the interval.
    pub fn average(&self) -> u64 {
        self.lower + (self.upper - self.lower) / 2
    }
}

impl fmt::Display for CardinalityEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}..{}, p={:.2})",
            self.lower, self.upper, self.correctness_prob
        )
    }
}

/// Callback estimating an output cardinality from the input cardinalities.
pub trait CardinalityEstimator: Send + Sync {
    /// Number of input estimates `estimate` expects.
    fn num_inputs(&self) -> usize;

    fn estimate(&self, inputs: &[CardinalityEstimate]) -> Result<CardinalityEstimate>;
}

impl fmt::Debug for dyn CardinalityEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardinalityEstimator(inputs={})", self.num_inputs())
    }
}

type CardinalityFn = dyn Fn(&[u64]) -> u64 + Send + Sync;

/// Applies a plain function to the lower and upper input bounds separately.
///
/// The result's correctness probability is `certainty` times the product of
/// the input probabilities.
#[derive(Clone)]
pub struct DefaultCardinalityEstimator {
    certainty: f64,
    num_inputs: usize,
    f: Arc<CardinalityFn>,
}

impl DefaultCardinalityEstimator {
    pub fn new<F>(certainty: f64, num_inputs: usize, f: F) -> Self
    where
        F: Fn(&[u64]) -> u64 + Send + Sync + 'static,
    {
        Self {
            certainty,
            num_inputs,
            f: Arc::new(f),
        }
    }

    pub fn certainty(&self) -> f64 {
        self.certainty
    }
}

impl CardinalityEstimator for DefaultCardinalityEstimator {
    fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    fn estimate(&self, inputs: &[CardinalityEstimate]) -> Result<CardinalityEstimate> {
        if inputs.len() != self.num_inputs {
            return Err(Error::Estimate(format!(
                "expected {} input estimates, got {}",
                self.num_inputs,
                inputs.len()
            )));
        }

        let lowers: Vec<u64> = inputs.iter().map(|e| e.lower()).collect();
        let uppers: Vec<u64> = inputs.iter().map(|e| e.upper()).collect();
        let prob = inputs
            .iter()
            .map(|e| e.correctness_prob())
            .fold(self.certainty, |acc, p| acc * p);

        Ok(CardinalityEstimate::new(
            (self.f)(&lowers),
            (self.f)(&uppers),
            prob,
        ))
    }
}

/// Always returns the same estimate, regardless of inputs.
#[derive(Debug, Clone, Copy)]
pub struct FixedCardinalityEstimator {
    num_inputs: usize,
    estimate: CardinalityEstimate,
}

impl FixedCardinalityEstimator {
    pub fn new(num_inputs: usize, estimate: CardinalityEstimate) -> Self {
        Self {
            num_inputs,
            estimate,
        }
    }
}

impl CardinalityEstimator for FixedCardinalityEstimator {
    fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    fn estimate(&self, inputs: &[CardinalityEstimate]) -> Result<CardinalityEstimate> {
        if inputs.len() != self.num_inputs {
            return Err(Error::Estimate(format!(
                "expected {} input estimates, got {}",
                self.num_inputs,
                inputs.len()
            )));
        }
        Ok(self.estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_bounds_separately() {
        let est = DefaultCardinalityEstimator::new(1.0, 2, |c| c[0] + c[1]);
        let out = est
            .estimate(&[
                CardinalityEstimate::new(10, 20, 1.0),
                CardinalityEstimate::new(1, 5, 1.0),
            ])
            .unwrap();
        assert_eq!(out.lower(), 11);
        assert_eq!(out.upper(), 25);
    }

    #[test]
    fn probabilities_multiply() {
        let est = DefaultCardinalityEstimator::new(0.5, 1, |c| c[0]);
        let out = est
            .estimate(&[CardinalityEstimate::new(3, 3, 0.8)])
            .unwrap();
        assert!((out.correctness_prob() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn wrong_input_count_is_rejected() {
        let est = DefaultCardinalityEstimator::new(1.0, 2, |c| c[0] + c[1]);
        assert!(matches!(
            est.estimate(&[CardinalityEstimate::exact(1)]),
            Err(Error::Estimate(_))
        ));
    }

    #[test]
    fn new_orders_bounds() {
        let e = CardinalityEstimate::new(9, 4, 2.0);
        assert_eq!((e.lower(), e.upper()), (4, 9));
        assert_eq!(e.correctness_prob(), 1.0);
        assert_eq!(e.average(), 6);
    }
}
