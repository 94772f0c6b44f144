pub mod aws;
pub mod config;
pub mod filter;
pub mod model;
pub mod ops;
pub mod report;
pub mod snapshot;
