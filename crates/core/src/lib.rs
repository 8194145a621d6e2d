pub mod candidate;
pub mod config;
pub mod error;

pub use candidate::*;
pub use config::Config;
pub use error::*;
