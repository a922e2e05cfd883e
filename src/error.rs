use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum Error {
    #[error("Invalid state for this operation")]
    InvalidState,
    #[error("Invalid input")]
    InvalidInput,
}

pub type Result<T> = std::result::Result<T, Error>;
