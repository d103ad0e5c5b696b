//! Services that combine several downloads into one answer.

pub mod aggregator;

pub use aggregator::{codes_published_on, AggregationOptions};
