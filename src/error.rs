use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("repository error: {0}")]
    Repository(String),

    #[error("spec registry error: {0}")]
    Registry(String),

    #[error("runner error: {0}")]
    Runner(String),

    #[error("spec publish error: {0}")]
    Publish(String),

    #[error("invalid registry seed: {0}")]
    Seed(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;
