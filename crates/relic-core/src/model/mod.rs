pub mod action;
pub mod legacy;
pub mod query;
pub mod saved_item;

pub use action::*;
pub use legacy::*;
pub use query::*;
pub use saved_item::*;
