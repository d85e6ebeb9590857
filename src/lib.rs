pub mod config;
pub mod errors;
pub mod index;
pub mod pipeline;
pub mod report;
pub mod resolution;
pub mod types;
