//! Generated no-op project that references every project in a manifest,
//! so one downstream build invocation can reach all of them.

mod aggregator;

pub use aggregator::generate_best_effort;
#[cfg(test)]
pub use aggregator::aggregator_path;
