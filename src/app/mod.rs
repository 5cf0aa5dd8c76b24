pub mod error;

pub use error::{GleanerError, Result};
