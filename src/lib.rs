//! tfbackend - Terraform S3 backend outputs
//!
//! Fetches a Terraform state file from S3 and exposes its outputs as a flat
//! name/value map for Ansible.

pub mod credentials;
pub mod error;
pub mod fetch;
pub mod module;
pub mod output;
pub mod storage;
pub mod terraform;

pub use credentials::{CredentialError, CredentialParams, CredentialSource};
pub use error::BackendError;
pub use fetch::{fetch_outputs, run};
pub use module::{Flavor, ModuleOutcome, ModuleParams, ParamError};
pub use storage::{MemoryStore, S3StateStore, StateStore, StorageError};
pub use terraform::{Outputs, StateDocument, StateError};
