//! Session state shared by every operation.

use crate::config::{ClientConfig, ExchangeVersion};
use crate::endpoint::autodiscover_endpoints;
use crate::error::EwsError;
use crate::negotiation::Negotiated;
use std::fmt;

/// Account credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email_address: String,
    pub password: String,
    /// Domain part of the e-mail address
    pub domain: String,
}

impl Credentials {
    pub fn new(email_address: impl Into<String>, password: impl Into<String>) -> Result<Self, EwsError> {
        let email_address = email_address.into();
        let password = password.into();

        let domain = match email_address.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => domain.to_string(),
            _ => {
                return Err(EwsError::Config(format!(
                    "'{}' is not a valid e-mail address",
                    email_address
                )))
            }
        };
        if password.is_empty() {
            return Err(EwsError::Config("password must not be empty".to_string()));
        }

        Ok(Self {
            email_address,
            password,
            domain,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email_address", &self.email_address)
            .field("password", &"<redacted>")
            .field("domain", &self.domain)
            .finish()
    }
}

/// A (version, endpoint) pair considered during autodiscover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub version: ExchangeVersion,
    pub endpoint: String,
}

/// Credentials, candidate lists and the committed endpoint/version.
///
/// The committed endpoint and version are either both set or both unset.
#[derive(Debug, Clone)]
pub struct Session {
    credentials: Credentials,
    candidate_versions: Vec<ExchangeVersion>,
    candidate_endpoints: Vec<String>,
    impersonation_header: Option<String>,
    endpoint: Option<String>,
    version: Option<ExchangeVersion>,
}

impl Session {
    /// Create an uncommitted session that needs autodiscover.
    pub fn new(
        credentials: Credentials,
        candidate_versions: Vec<ExchangeVersion>,
        candidate_endpoints: Vec<String>,
    ) -> Result<Self, EwsError> {
        if candidate_versions.is_empty() {
            return Err(EwsError::Config("at least one Exchange version is required".to_string()));
        }
        if candidate_endpoints.is_empty() {
            return Err(EwsError::Config("at least one candidate endpoint is required".to_string()));
        }
        Ok(Self {
            credentials,
            candidate_versions,
            candidate_endpoints,
            impersonation_header: None,
            endpoint: None,
            version: None,
        })
    }

    /// Create a session bound to a known endpoint, bypassing autodiscover.
    pub fn with_endpoint(
        credentials: Credentials,
        endpoint: impl Into<String>,
        version: ExchangeVersion,
    ) -> Self {
        let endpoint = endpoint.into();
        Self {
            credentials,
            candidate_versions: vec![version],
            candidate_endpoints: vec![endpoint.clone()],
            impersonation_header: None,
            endpoint: Some(endpoint),
            version: Some(version),
        }
    }

    /// Build a session from configuration.
    ///
    /// An explicit `ews_url` is committed with the first configured version.
    /// Otherwise the configured candidate endpoints are used, falling back to
    /// the endpoints generated from the e-mail domain.
    pub fn from_config(config: &ClientConfig) -> Result<Self, EwsError> {
        let credentials = Credentials::new(
            config.credentials.email_address.clone(),
            config.credentials.password.clone(),
        )?;

        let versions = if config.exchange_versions.is_empty() {
            ExchangeVersion::ALL.to_vec()
        } else {
            config.exchange_versions.clone()
        };

        let session = match config.ews_url.as_deref() {
            Some(url) if !url.trim().is_empty() => {
                Self::with_endpoint(credentials, url.trim(), versions[0])
            }
            _ => {
                if !config.autodiscover.enabled {
                    return Err(EwsError::Config(
                        "autodiscover is disabled and no ews_url is configured".to_string(),
                    ));
                }
                let endpoints = if config.autodiscover.endpoints.is_empty() {
                    autodiscover_endpoints(&credentials.domain)?
                } else {
                    config.autodiscover.endpoints.clone()
                };
                Self::new(credentials, versions, endpoints)?
            }
        };

        Ok(match &config.impersonation {
            Some(impersonation) => session.with_impersonation_header(impersonation.header()),
            None => session,
        })
    }

    /// Attach an impersonation header fragment, injected verbatim into requests.
    pub fn with_impersonation_header(mut self, header: impl Into<String>) -> Self {
        self.impersonation_header = Some(header.into());
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn candidate_versions(&self) -> &[ExchangeVersion] {
        &self.candidate_versions
    }

    pub fn candidate_endpoints(&self) -> &[String] {
        &self.candidate_endpoints
    }

    /// Every (version, endpoint) pair, version-major in declared order.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.candidate_versions
            .iter()
            .flat_map(|version| {
                self.candidate_endpoints.iter().map(move |endpoint| Candidate {
                    version: *version,
                    endpoint: endpoint.clone(),
                })
            })
            .collect()
    }

    /// Impersonation header fragment, or an empty string.
    pub fn impersonation_header(&self) -> &str {
        self.impersonation_header.as_deref().unwrap_or("")
    }

    /// Committed endpoint.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Committed version.
    pub fn version(&self) -> Option<ExchangeVersion> {
        self.version
    }

    pub fn is_committed(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Copy of this session bound to a candidate, for a single attempt.
    pub(crate) fn trial(&self, candidate: &Candidate) -> Self {
        let mut trial = self.clone();
        trial.endpoint = Some(candidate.endpoint.clone());
        trial.version = Some(candidate.version);
        trial
    }

    /// Apply a successful autodiscover result.
    pub fn commit(self, negotiated: &Negotiated) -> Result<Self, EwsError> {
        if self.is_committed() {
            return Err(EwsError::AlreadyNegotiated);
        }
        Ok(self.trial(&negotiated.candidate))
    }
}
