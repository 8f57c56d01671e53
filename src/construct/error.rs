use std::error::Error as StdError;

use thiserror::Error;

/// First failure of a construct run. Apart from the logout step, the message
/// is the collaborator's own error text.
#[derive(Debug, Error)]
pub(crate) enum ConstructError {
    #[error("{0}")]
    CreateProvisionDir(Box<dyn StdError>),
    #[error("{0}")]
    UploadArtifact(Box<dyn StdError>),
    #[error("{0}")]
    EnableWinRm(Box<dyn StdError>),
    #[error("{0}")]
    ValidateConnection(Box<dyn StdError>),
    #[error("{0}")]
    ExtractArchive(Box<dyn StdError>),
    #[error("failed to log out remote user: {0}")]
    LogOutUsers(String),
    #[error("{0}")]
    ExecuteScript(Box<dyn StdError>),
    #[error("{0}")]
    AwaitShutdown(Box<dyn StdError>),
}
