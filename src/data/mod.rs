//! Raw data acquisition and daily resampling.
//!
//! - dataset download (`source`)
//! - seeded offline records (`synthetic`)
//! - nearest-neighbor daily resampling (`resample`)

pub mod resample;
pub mod source;
pub mod synthetic;

pub use resample::{resample_daily, sort_and_dedup};
pub use source::{DEFAULT_DATA_URL, DatasetClient, configured_url};
pub use synthetic::{SyntheticSpec, generate_synthetic};
