//! Built-in event handlers.
//!
//! - [`DoseScoring`]: energy deposition per region and per medium
//! - [`RangeRejection`]: variance reduction by discarding charged
//!   particles that cannot leave their region

mod dose;
mod range;

pub use dose::DoseScoring;
pub use range::RangeRejection;
