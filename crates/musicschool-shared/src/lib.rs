pub mod constants;
pub mod error;
pub mod models;
pub mod progress;
pub mod types;
pub mod validation;
