use thiserror::Error;

use crate::database::table::IdentifierError;

#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    #[error(transparent)]
    InvalidColumn(#[from] IdentifierError),

    #[error("Invalid order direction: {0}")]
    InvalidDirection(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),
}
