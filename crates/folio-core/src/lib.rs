pub mod error;
pub mod types;

mod math;

pub mod instrument;
pub mod profile;

pub mod allocation;
pub mod construction;
pub mod estimation;
pub mod metrics;
pub mod strategies;

#[cfg(feature = "projection")]
pub mod projection;

pub use error::FolioError;
pub use types::*;

/// Standard result type for all folio operations
pub type FolioResult<T> = Result<T, FolioError>;
