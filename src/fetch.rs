use crate::error::BackendError;
use crate::module::ModuleParams;
use crate::storage::{S3StateStore, StateStore, StorageError};
use crate::terraform::{Outputs, StateDocument};

/// Downloads one state object and flattens its outputs.
pub async fn fetch_outputs(
    store: &dyn StateStore,
    bucket: &str,
    key: &str,
) -> Result<Outputs, BackendError> {
    let raw = store.get_object(bucket, key).await?;
    tracing::debug!(
        store = store.name(),
        bucket,
        key,
        bytes = raw.len(),
        "state object fetched"
    );

    let text = String::from_utf8(raw).map_err(|_| StorageError::Encoding {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })?;

    let outputs = StateDocument::parse(&text)?.flatten()?;
    tracing::info!(count = outputs.len(), "state outputs flattened");

    Ok(outputs)
}

/// Resolves credentials, connects to S3 and fetches the configured state.
pub async fn run(params: &ModuleParams) -> Result<Outputs, BackendError> {
    let source = params.credentials.resolve()?;
    tracing::info!(
        credentials = source.strategy(),
        bucket = %params.bucket,
        key = %params.object,
        "fetching Terraform state"
    );

    let store = S3StateStore::connect(&source, params.endpoint_url.as_deref()).await;
    fetch_outputs(&store, &params.bucket, &params.object).await
}
