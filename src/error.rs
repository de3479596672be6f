use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("no recording timestamp derivable for `{0}`")]
    InvalidMetadata(String),
    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
    #[error("configuration invalid: {0}")]
    ConfigurationError(String),
}
