//! First Fit packing of one-dimensional weights.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Slack allowed when comparing fill levels, absorbing rounding in fractional sums.
const FIT_EPSILON: f64 = 1e-9;

/// A container accumulating assigned weights.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Container {
    filled: f64,
    item_count: usize,
}

impl Container {
    fn with_item(weight: f64) -> Self {
        Self {
            filled: weight,
            item_count: 1,
        }
    }

    /// Sum of the assigned weights.
    pub fn filled(&self) -> f64 {
        self.filled
    }

    /// Number of assigned items.
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Capacity left unused.
    pub fn free(&self, capacity: f64) -> f64 {
        (capacity - self.filled).max(0.0)
    }

    fn fits(&self, weight: f64, capacity: f64) -> bool {
        self.filled + weight <= capacity + FIT_EPSILON
    }

    fn add(&mut self, weight: f64) {
        self.filled += weight;
        self.item_count += 1;
    }
}

/// Containers produced by one packing run, in creation order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Packing {
    pub capacity: f64,
    pub containers: Vec<Container>,
}

impl Packing {
    /// Number of containers used.
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    fn allocated(&self) -> f64 {
        self.containers.len() as f64 * self.capacity
    }

    /// Share of allocated space left unfilled; `0.0` without containers.
    pub fn fragmentation(&self) -> f64 {
        if self.containers.is_empty() {
            return 0.0;
        }
        let free: f64 = self.containers.iter().map(|c| c.free(self.capacity)).sum();
        free / self.allocated()
    }

    /// Share of allocated space actually used; `0.0` without containers.
    pub fn fill_rate(&self) -> f64 {
        if self.containers.is_empty() {
            return 0.0;
        }
        let filled: f64 = self.containers.iter().map(Container::filled).sum();
        filled / self.allocated()
    }

    /// Fill levels of all containers.
    pub fn fill_levels(&self) -> Vec<f64> {
        self.containers.iter().map(Container::filled).collect()
    }
}

/// Largest weight relative to the capacity; `0.0` for an empty sequence.
pub fn max_weight_ratio(weights: &[f64], capacity: f64) -> f64 {
    weights
        .iter()
        .copied()
        .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |m| m.max(w))))
        .map_or(0.0, |max| max / capacity)
}

/// Theoretical minimum number of containers: `ceil(sum / capacity)`.
pub fn lower_bound(weights: &[f64], capacity: f64) -> usize {
    let total: f64 = weights.iter().sum();
    ((total / capacity) - FIT_EPSILON).ceil().max(0.0) as usize
}

/// First Fit packer.
///
/// Each item goes into the first container, in creation order, whose fill level
/// plus the item does not exceed the capacity; otherwise a new container is
/// opened. Items larger than the capacity are rejected.
#[derive(Debug, Clone, Copy)]
pub struct FirstFitPacker {
    capacity: f64,
}

impl FirstFitPacker {
    /// Creates a packer for containers of the given capacity.
    pub fn new(capacity: f64) -> Result<Self> {
        if !(capacity.is_finite() && capacity > 0.0) {
            return Err(Error::invalid(format!(
                "capacity must be positive and finite, got {}",
                capacity
            )));
        }
        Ok(Self { capacity })
    }

    /// Container capacity.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Packs the weights in arrival order.
    pub fn pack(&self, weights: &[f64]) -> Result<Packing> {
        let mut containers: Vec<Container> = Vec::new();

        for (index, &weight) in weights.iter().enumerate() {
            if !(weight.is_finite() && weight > 0.0) {
                return Err(Error::invalid(format!(
                    "item {} has non-positive weight {}",
                    index, weight
                )));
            }
            if weight > self.capacity + FIT_EPSILON {
                return Err(Error::OversizedItem {
                    index,
                    weight,
                    capacity: self.capacity,
                });
            }

            match containers
                .iter_mut()
                .find(|c| c.fits(weight, self.capacity))
            {
                Some(container) => container.add(weight),
                None => containers.push(Container::with_item(weight)),
            }
        }

        Ok(Packing {
            capacity: self.capacity,
            containers,
        })
    }

    /// Packs the weights and returns only the container count.
    pub fn count(&self, weights: &[f64]) -> Result<usize> {
        self.pack(weights).map(|p| p.container_count())
    }
}
