pub mod cohort;
pub mod error;
pub mod metrics;
pub mod snapshot;
pub mod store;
pub mod tracker;
