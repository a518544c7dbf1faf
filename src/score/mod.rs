pub mod cache;
pub mod engine;
pub mod factors;
pub mod profile;
pub mod scorer;
