//! The four map/reduce components of the loyalty pipeline.
//!
//! Each one is a pure function of its input line or of `(key, values)`; none
//! keeps state across calls, so the engine may run any number of copies in
//! parallel.

pub mod customer_aggregator;
pub mod record_parser;
pub mod tier_aggregator;
pub mod tier_classifier;

pub use customer_aggregator::CustomerAggregator;
pub use record_parser::RecordParser;
pub use tier_aggregator::TierAggregator;
pub use tier_classifier::TierClassifier;
