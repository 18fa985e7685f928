pub mod alert_error;
pub mod error;
pub mod exception;

pub use alert_error::*;
pub use error::*;
pub use exception::*;
