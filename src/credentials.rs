use thiserror::Error;

pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// Only one half of the access key pair was supplied.
    #[error("Wrong AWS credentials")]
    Mismatched,
}

/// Raw credential inputs as they arrive from the CLI or module arguments.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialParams {
    pub access_key: String,
    pub secret_key: String,
    /// Temporary credentials from STS carry a session token with the key pair.
    pub session_token: Option<String>,
    pub profile: String,
    pub region: String,
}

impl Default for CredentialParams {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            session_token: None,
            profile: DEFAULT_PROFILE.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

/// Credential material selected for building a storage session.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Static {
        access_key: String,
        secret_key: String,
        session_token: Option<String>,
        region: String,
    },
    Profile {
        name: String,
        fallback_region: String,
    },
}

impl CredentialParams {
    /// Explicit keys win over the profile. A half-filled key pair is rejected.
    pub fn resolve(&self) -> Result<CredentialSource, CredentialError> {
        match (self.access_key.is_empty(), self.secret_key.is_empty()) {
            (false, false) => {
                tracing::debug!(region = %self.region, "using static AWS credentials");
                Ok(CredentialSource::Static {
                    access_key: self.access_key.clone(),
                    secret_key: self.secret_key.clone(),
                    session_token: self.session_token.clone().filter(|t| !t.is_empty()),
                    region: self.region.clone(),
                })
            }
            (true, true) => {
                tracing::debug!(profile = %self.profile, "using AWS profile credentials");
                Ok(CredentialSource::Profile {
                    name: self.profile.clone(),
                    fallback_region: self.region.clone(),
                })
            }
            _ => Err(CredentialError::Mismatched),
        }
    }
}

impl CredentialSource {
    pub fn strategy(&self) -> &'static str {
        match self {
            CredentialSource::Static { .. } => "static",
            CredentialSource::Profile { .. } => "profile",
        }
    }
}

impl std::fmt::Debug for CredentialParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialParams")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .field("profile", &self.profile)
            .field("region", &self.region)
            .finish()
    }
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Static {
                access_key,
                session_token,
                region,
                ..
            } => f
                .debug_struct("Static")
                .field("access_key", access_key)
                .field("secret_key", &"[REDACTED]")
                .field("session_token", &session_token.as_ref().map(|_| "[REDACTED]"))
                .field("region", region)
                .finish(),
            CredentialSource::Profile {
                name,
                fallback_region,
            } => f
                .debug_struct("Profile")
                .field("name", name)
                .field("fallback_region", fallback_region)
                .finish(),
        }
    }
}
