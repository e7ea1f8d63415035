pub mod backend;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod policy;
pub mod range;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
