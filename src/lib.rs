pub mod analysis;
pub mod boundary;
pub mod cache;
pub mod config;
pub mod country;
pub mod error;
pub mod fetch;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod sources;
