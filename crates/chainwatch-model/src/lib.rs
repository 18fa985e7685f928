pub mod action;
pub mod action_results;
pub mod chained;
pub mod query_level;
pub mod trigger;

pub use action::*;
pub use action_results::*;
pub use chained::*;
pub use query_level::*;
pub use trigger::*;
