//! Hemisphere direction sets for irradiance sampling.
//!
//! # Module Structure
//!
//! - [`mapping`]: equal-area square to hemisphere mapping and its inverse
//! - [`directions`]: `HemisphereDirections` - the full-sphere set built from
//!   an `R x R` grid of square cell centres plus their lower mirrors

pub mod directions;
pub mod mapping;

pub use directions::HemisphereDirections;
pub use mapping::{hemisphere_to_point, point_to_hemisphere};
