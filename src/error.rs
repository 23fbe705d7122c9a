use thiserror::Error;

#[derive(Error, Debug)]
pub enum PetqlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error(
        "Field \"{field}\" argument \"{argument}\" of type \"{ty}\" is required, but it was not provided."
    )]
    MissingArgument {
        field: String,
        argument: String,
        ty: String,
    },

    #[error("Argument \"{argument}\" has invalid value: {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file already exists at {0}")]
    AlreadyInitialized(String),
}

pub type Result<T> = std::result::Result<T, PetqlError>;
