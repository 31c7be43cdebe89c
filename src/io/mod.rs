pub mod chat;
pub mod workbook;

pub use chat::*;
pub use workbook::*;
