pub mod data;
pub mod schema;

pub use data::{ClientError, CrmClient};
pub use schema::{normalize, sanitize};
