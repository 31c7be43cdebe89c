pub mod bundle;
pub mod query;
pub mod table;
pub mod transcript;
pub mod turn;

pub use bundle::*;
pub use query::*;
pub use table::*;
pub use transcript::*;
pub use turn::*;
