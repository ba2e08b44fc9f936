//! Data models for the application
//!
//! Request-scoped values: the uploaded file, the layout returned by the
//! document-understanding service, and the record handed to the database.

mod layout;
mod record;
mod upload;

pub use layout::*;
pub use record::*;
pub use upload::*;
