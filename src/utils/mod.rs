pub mod error;
pub mod money;
pub mod params;
pub mod query;
pub mod telemetry;
pub mod types;
pub mod validated;

pub use error::{AppError, handler_404, internal_error};
pub use params::{Path, Query};
pub use validated::ValidatedJson;
