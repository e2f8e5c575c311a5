// Domain models

mod relay;
mod sample;
mod series;

pub use relay::Relay;
pub use sample::SampleCount;
pub use series::{SamplePoint, SeriesRecord};
