use thiserror::Error;

use crate::credentials::CredentialError;
use crate::module::ParamError;
use crate::storage::StorageError;
use crate::terraform::StateError;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to parse Terraform state: {0}")]
    Parse(#[from] StateError),

    #[error(transparent)]
    Params(#[from] ParamError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
