pub mod error;
pub mod money;
pub mod patch;

pub use error::{AppError, Result};
pub use patch::Patch;
