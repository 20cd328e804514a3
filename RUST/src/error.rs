use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReltreeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("record type '{0}' not found")]
    UnknownType(String),

    #[error("{type_name} with id {id} not found")]
    RecordNotFound { type_name: String, id: String },

    #[error("relationship `{relationship}` on {type_name} targets unknown type '{target}'")]
    UnknownRelationship {
        type_name: String,
        relationship: String,
        target: String,
    },
}

pub type Result<T> = std::result::Result<T, ReltreeError>;
