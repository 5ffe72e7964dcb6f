pub mod base;
pub mod logging;
pub mod output;

pub use base::*;
pub use logging::*;
pub use output::*;
