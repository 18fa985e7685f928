pub mod config;
pub mod input;
pub mod output;
pub mod traits;

pub use config::*;
pub use input::*;
pub use output::*;
pub use traits::*;
