//! Ansible module protocol: argument parsing and result objects.
//!
//! A binary module receives the path of a JSON arguments file and answers
//! with a single JSON object on stdout.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::credentials::{CredentialParams, DEFAULT_PROFILE, DEFAULT_REGION};
use crate::error::BackendError;
use crate::terraform::Outputs;

const WRAPPED_ARGS_KEY: &str = "ANSIBLE_MODULE_ARGS";
const INTERNAL_PREFIX: &str = "_ansible_";
const SHARED_PARAMS: &[&str] = &[
    "bucket",
    "aws_profile",
    "aws_access_key",
    "aws_secret_access_key",
    "aws_session_token",
    "aws_region",
    "endpoint_url",
];

/// Which of the two plugin shapes is being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Flavor {
    /// `object` parameter, outputs returned under `vars`
    #[value(name = "fetch")]
    FetchOutputs,
    /// `key` parameter, outputs returned under `meta`
    #[value(name = "s3")]
    S3Backend,
}

impl Flavor {
    pub fn module_name(self) -> &'static str {
        match self {
            Flavor::FetchOutputs => "fetch_terraform_backend_outputs",
            Flavor::S3Backend => "s3_terraform_backend",
        }
    }

    pub fn object_param(self) -> &'static str {
        match self {
            Flavor::FetchOutputs => "object",
            Flavor::S3Backend => "key",
        }
    }

    pub fn result_field(self) -> &'static str {
        match self {
            Flavor::FetchOutputs => "vars",
            Flavor::S3Backend => "meta",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("arguments file is not a JSON object: {0}")]
    Malformed(String),

    #[error("Unsupported parameters for ({module}) module: {names}")]
    Unsupported { module: &'static str, names: String },

    #[error("missing required arguments: {0}")]
    Missing(String),

    #[error("parameters are mutually exclusive: object|key")]
    MutuallyExclusive,

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("argument {name} is of type {kind} and we were unable to convert to str")]
    NotAString { name: String, kind: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleParams {
    pub flavor: Flavor,
    pub bucket: String,
    /// State object key, named `object` or `key` depending on the flavor.
    pub object: String,
    pub credentials: CredentialParams,
    pub endpoint_url: Option<String>,
}

impl ModuleParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.bucket.is_empty() {
            return Err(ParamError::Empty("bucket"));
        }
        if self.object.is_empty() {
            return Err(ParamError::Empty(self.flavor.object_param()));
        }
        Ok(())
    }

    /// Builds validated parameters from a module arguments object.
    ///
    /// The flavor is inferred from which of `object`/`key` is present unless
    /// `forced` pins it.
    pub fn from_args(args: Value, forced: Option<Flavor>) -> Result<Self, ParamError> {
        let mut args = match args {
            Value::Object(map) => map,
            other => return Err(ParamError::Malformed(json_kind(&other).to_string())),
        };
        match args.remove(WRAPPED_ARGS_KEY) {
            None => {}
            Some(Value::Object(inner)) => args = inner,
            Some(other) => {
                return Err(ParamError::Malformed(format!(
                    "{} is a {}, expected a dict",
                    WRAPPED_ARGS_KEY,
                    json_kind(&other)
                )));
            }
        }
        args.retain(|name, _| !name.starts_with(INTERNAL_PREFIX));

        let has = |name: &str| args.get(name).is_some_and(|v| !v.is_null());
        let flavor = match forced {
            Some(flavor) => flavor,
            None => match (has("object"), has("key")) {
                (true, true) => return Err(ParamError::MutuallyExclusive),
                (false, true) => Flavor::S3Backend,
                _ => Flavor::FetchOutputs,
            },
        };

        let unsupported: BTreeSet<&str> = args
            .keys()
            .map(String::as_str)
            .filter(|name| *name != flavor.object_param() && !SHARED_PARAMS.contains(name))
            .collect();
        if !unsupported.is_empty() {
            return Err(ParamError::Unsupported {
                module: flavor.module_name(),
                names: unsupported.into_iter().collect::<Vec<_>>().join(", "),
            });
        }

        let bucket = string_arg(&args, "bucket")?;
        let object = string_arg(&args, flavor.object_param())?;
        let missing: Vec<&str> = [("bucket", &bucket), (flavor.object_param(), &object)]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect();
        if !missing.is_empty() {
            return Err(ParamError::Missing(missing.join(", ")));
        }

        let credentials = CredentialParams {
            access_key: string_arg(&args, "aws_access_key")?.unwrap_or_default(),
            secret_key: string_arg(&args, "aws_secret_access_key")?.unwrap_or_default(),
            session_token: string_arg(&args, "aws_session_token")?,
            profile: string_arg(&args, "aws_profile")?
                .unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
            region: string_arg(&args, "aws_region")?
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        };

        let params = Self {
            flavor,
            bucket: bucket.unwrap_or_default(),
            object: object.unwrap_or_default(),
            credentials,
            endpoint_url: string_arg(&args, "endpoint_url")?.filter(|url| !url.is_empty()),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn from_args_file(path: &Path, forced: Option<Flavor>) -> Result<Self, BackendError> {
        let text = std::fs::read_to_string(path)?;
        let args: Value =
            serde_json::from_str(&text).map_err(|e| ParamError::Malformed(e.to_string()))?;
        Ok(Self::from_args(args, forced)?)
    }
}

/// Scalars are accepted as strings the way Ansible coerces `type: str` options.
fn string_arg(args: &Map<String, Value>, name: &str) -> Result<Option<String>, ParamError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(ParamError::NotAString {
            name: name.to_string(),
            kind: json_kind(other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Final answer reported to the host automation tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleOutcome {
    Success { flavor: Flavor, outputs: Outputs },
    Failure { msg: String },
}

impl ModuleOutcome {
    pub fn from_result(flavor: Flavor, result: Result<Outputs, BackendError>) -> Self {
        match result {
            Ok(outputs) => ModuleOutcome::Success { flavor, outputs },
            Err(err) => Self::failure(err),
        }
    }

    pub fn failure(err: BackendError) -> Self {
        tracing::debug!(error = ?err, "module failed");
        ModuleOutcome::Failure {
            msg: err.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ModuleOutcome::Failure { .. })
    }

    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        match self {
            ModuleOutcome::Success { flavor, outputs } => {
                body.insert("changed".to_string(), Value::Bool(false));
                let outputs: Map<String, Value> = outputs
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                body.insert(flavor.result_field().to_string(), Value::Object(outputs));
            }
            ModuleOutcome::Failure { msg } => {
                body.insert("failed".to_string(), Value::Bool(true));
                body.insert("msg".to_string(), Value::String(msg.clone()));
            }
        }
        Value::Object(body)
    }
}
