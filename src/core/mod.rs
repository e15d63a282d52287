pub mod error;
pub mod types;

pub use error::{CrmError, Result};
pub use types::{ChangeEvent, Page, SelectionItem, Sort};
