//! Regions of interest
//!
//! This module defines the region handed to one extraction job and the lazy
//! enumerator producing them from label volumes and segmentations.

mod roi;
mod enumerator;

pub use roi::{Region, RegionSource};
pub use enumerator::RegionEnumerator;
