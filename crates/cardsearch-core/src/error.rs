use thiserror::Error;

use crate::types::EntityType;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Network error while searching {entity}: {message}")]
    Network { entity: EntityType, message: String },

    #[error("Search for {entity} returned HTTP {status}")]
    Status { entity: EntityType, status: u16 },

    #[error("Could not decode {entity} response: {message}")]
    Decode { entity: EntityType, message: String },

    #[error("No parent selected; cannot select a child result")]
    NoParentSelected,

    #[error("Search session is closed")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
