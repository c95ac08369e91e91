// Core essentials used across the crate.
pub use crate::core::config::Config;
pub use crate::core::error::{AppError, Result};

pub use std::io;
pub use std::time::{Duration, Instant};
