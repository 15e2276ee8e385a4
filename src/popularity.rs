// src/popularity.rs
//
// Skewed node popularity: a categorical distribution with a Dirichlet prior
//

use anyhow::{anyhow, bail, Context, Result};
use rand::distr::weighted::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Gamma};

/// Categorical distribution over `[0, n)` whose weights follow Dirichlet(α, …, α).
///
/// A vector of i.i.d. Gamma(α, 1) draws, once normalized, is Dirichlet(α)
/// distributed. `WeightedIndex` normalizes on its own, so the raw gamma draws
/// are used directly as weights.
///
/// Small α concentrates the mass on a handful of indices; large α approaches
/// a uniform choice.
#[derive(Debug, Clone)]
pub struct PopularityDistribution {
    weights: Vec<f64>,
    index: WeightedIndex<f64>,
}

impl PopularityDistribution {
    /// Build the distribution, drawing all `n` weights from `rng`.
    pub fn dirichlet<R: Rng + ?Sized>(n: usize, alpha: f64, rng: &mut R) -> Result<Self> {
        if n == 0 {
            bail!("Cannot build a popularity distribution over an empty population");
        }
        let gamma = Gamma::new(alpha, 1.0)
            .map_err(|e| anyhow!("Invalid dirichlet_alpha {}: {}", alpha, e))?;

        let weights: Vec<f64> = (0..n).map(|_| gamma.sample(rng)).collect();
        let index = WeightedIndex::new(&weights)
            .with_context(|| format!("Degenerate popularity weights (alpha={}, n={})", alpha, n))?;

        Ok(Self { weights, index })
    }

    /// Draw one index in `[0, n)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index.sample(rng)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Unnormalized weights, in index order
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of indices that can actually be drawn.
    ///
    /// Gamma draws for a small α underflow to exactly zero, so this can be
    /// well below `len()`.
    pub fn support_len(&self) -> usize {
        self.weights.iter().filter(|&&w| w > 0.0).count()
    }

    /// The same distribution with every index for which `exclude` holds
    /// given zero weight, or `None` when nothing drawable is left.
    ///
    /// Rebuilt from the masked weights rather than updated in place: the
    /// weights span hundreds of orders of magnitude and incremental
    /// subtraction from the running total does not survive that.
    pub fn without<F: Fn(usize) -> bool>(&self, exclude: F) -> Result<Option<Self>> {
        let weights: Vec<f64> = self
            .weights
            .iter()
            .enumerate()
            .map(|(i, &w)| if exclude(i) { 0.0 } else { w })
            .collect();
        if !weights.iter().any(|&w| w > 0.0) {
            return Ok(None);
        }
        let index = WeightedIndex::new(&weights)
            .with_context(|| format!("Degenerate popularity weights after excluding used nodes (n={})", weights.len()))?;
        Ok(Some(Self { weights, index }))
    }
}
