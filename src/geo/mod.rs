//! Geographic location and solar event calculations.
//!
//! ## Module Structure
//!
//! - [`location`]: validated latitude/longitude pair
//! - [`solar`]: the [`SunriseSunsetProvider`] seam and its `sunrise`-crate implementation
//!
//! Sunrise/sunset-relative schedule commands resolve their trigger time through
//! this module every time they are evaluated, because the solar events drift a
//! little every day.

pub mod location;
pub mod solar;

pub use location::GeoLocation;
pub use solar::{SolarCalculator, SunriseSunsetInfo, SunriseSunsetProvider};
#[cfg(any(test, feature = "testing-support"))]
pub use solar::FixedSolarProvider;
#[cfg(test)]
pub use solar::MockSunriseSunsetProvider;
