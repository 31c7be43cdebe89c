pub mod cross_section;
pub mod longitudinal;

pub use cross_section::*;
pub use longitudinal::*;
