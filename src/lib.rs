pub mod api;
pub mod core;
pub mod error;
pub mod export;

pub use error::{GearingError, Result};
