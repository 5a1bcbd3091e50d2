//! Queue module: the per-batch aggregation queue and the completion barrier.

mod aggregation;
mod wait_group;

pub use aggregation::AggregationQueue;
pub use wait_group::WaitGroup;
