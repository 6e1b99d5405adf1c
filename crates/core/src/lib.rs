//! # U-FirstFit Core
//!
//! Controlled weight-sequence generation and First Fit packing for empirical
//! bin-packing experiments.
//!
//! ## Core Components
//!
//! - **Capacity**: [`Capacity`] - integral or normalized container capacity and the weight bounds it implies
//! - **Shapes**: [`WeightShape`] - base distribution selector (normal, uniform, exponential, coefficient of variation)
//! - **Generator**: [`WeightGenerator`] - base sampling followed by large-item and standard-item corrections
//! - **Packer**: [`FirstFitPacker`] - linear-scan First Fit with fragmentation and fill-rate metrics
//!
//! ## Example
//!
//! ```rust
//! use rand::SeedableRng;
//! use u_firstfit_core::{Capacity, ControlParameters, FirstFitPacker, WeightGenerator, WeightShape};
//!
//! let params = ControlParameters::new(100, WeightShape::Uniform, Capacity::Units(200))
//!     .with_large_items_ratio(0.2)
//!     .with_standard_ratio(0.3);
//! let generator = WeightGenerator::new(params).unwrap();
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let (weights, metrics) = generator.generate(&mut rng).unwrap();
//! assert_eq!(metrics.item_count, 100);
//!
//! let packer = FirstFitPacker::new(200.0).unwrap();
//! let containers = packer.count(&weights).unwrap();
//! assert!(containers <= 100);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support (default)

pub mod capacity;
pub mod error;
pub mod generator;
pub mod packer;
pub mod shape;
pub mod stats;

// Re-exports
pub use capacity::{Capacity, LARGE_ITEM_THRESHOLD};
pub use error::{Error, Result};
pub use generator::{
    correct_large_ratio, correct_standard_ratio, generate_base, is_standard, snap_to_standard,
    AchievedMetrics, ControlParameters, WeightGenerator,
};
pub use packer::{lower_bound, max_weight_ratio, Container, FirstFitPacker, Packing};
pub use shape::WeightShape;
