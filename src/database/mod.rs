pub mod manager;
pub mod record;
pub mod repair;
pub mod repository;
pub mod setup;
pub mod table;

pub use manager::{DatabaseError, DatabaseManager};
pub use record::{Record, RecordError};
pub use repository::{Repository, WriteError};
pub use table::{Column, Table};
