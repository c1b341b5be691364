use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Invalid field name: {0}")]
    InvalidField(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),
}
