//! Configuration types for the EWS client.

use crate::error::{xml_escape, EwsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Main configuration for the EWS client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Account used for HTTP basic authentication
    pub credentials: CredentialsConfig,

    /// Candidate protocol versions, tried in order during autodiscover
    pub exchange_versions: Vec<ExchangeVersion>,

    /// Autodiscover settings
    pub autodiscover: AutodiscoverConfig,

    /// Explicit EWS endpoint; bypasses autodiscover when set
    pub ews_url: Option<String>,

    /// Act on behalf of another mailbox
    pub impersonation: Option<Impersonation>,

    /// General settings
    pub settings: SettingsConfig,
}

impl ClientConfig {
    /// Parse a configuration document.
    pub fn from_yaml_str(content: &str) -> Result<Self, EwsError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        if config.exchange_versions.is_empty() {
            config.exchange_versions = ExchangeVersion::ALL.to_vec();
        }
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, EwsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

/// Account credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub email_address: String,
    pub password: String,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("email_address", &self.email_address)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Autodiscover configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutodiscoverConfig {
    /// Run autodiscover when no explicit `ews_url` is configured
    pub enabled: bool,

    /// Candidate endpoints, tried in order; generated from the e-mail domain when empty
    pub endpoints: Vec<String>,
}

impl Default for AutodiscoverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoints: Vec::new(),
        }
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Timeout for each SOAP request (seconds)
    pub timeout_secs: u64,

    /// Timeout for the reachability probe made before each autodiscover attempt (seconds)
    pub probe_timeout_secs: u64,

    /// What an operation does when its request fails
    pub fail_action: FailAction,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            probe_timeout_secs: 10,
            fail_action: FailAction::Continue,
            user_agent: format!("ews-soap-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Failure action when an operation's request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailAction {
    /// Return the error to the caller, which aborts the run
    Stop,
    /// Log the error and yield no records
    #[default]
    Continue,
}

/// The Exchange Server version identifiers allowed in `RequestServerVersion`
/// headers.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeVersion {
    Office365,
    Exchange2019,
    Exchange2016,
    Exchange2015,
    Exchange2013_SP1,
    Exchange2013,
    Exchange2010_SP2,
    Exchange2010_SP1,
    Exchange2010,
    Exchange2007_SP1,
    Exchange2007,
}

impl ExchangeVersion {
    /// Every known version, newest first.
    pub const ALL: [ExchangeVersion; 11] = [
        Self::Office365,
        Self::Exchange2019,
        Self::Exchange2016,
        Self::Exchange2015,
        Self::Exchange2013_SP1,
        Self::Exchange2013,
        Self::Exchange2010_SP2,
        Self::Exchange2010_SP1,
        Self::Exchange2010,
        Self::Exchange2007_SP1,
        Self::Exchange2007,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Office365 => "Office365",
            Self::Exchange2019 => "Exchange2019",
            Self::Exchange2016 => "Exchange2016",
            Self::Exchange2015 => "Exchange2015",
            Self::Exchange2013_SP1 => "Exchange2013_SP1",
            Self::Exchange2013 => "Exchange2013",
            Self::Exchange2010_SP2 => "Exchange2010_SP2",
            Self::Exchange2010_SP1 => "Exchange2010_SP1",
            Self::Exchange2010 => "Exchange2010",
            Self::Exchange2007_SP1 => "Exchange2007_SP1",
            Self::Exchange2007 => "Exchange2007",
        }
    }
}

impl fmt::Display for ExchangeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeVersion {
    type Err = EwsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|version| version.as_str() == s)
            .ok_or_else(|| EwsError::Config(format!("unknown Exchange version '{}'", s)))
    }
}

/// Identity to impersonate via the `ExchangeImpersonation` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impersonation {
    SmtpAddress(String),
    PrincipalName(String),
    Sid(String),
}

impl Impersonation {
    /// Render the SOAP header fragment.
    pub fn header(&self) -> String {
        let (tag, value) = match self {
            Self::SmtpAddress(v) => ("PrimarySmtpAddress", v),
            Self::PrincipalName(v) => ("PrincipalName", v),
            Self::Sid(v) => ("SID", v),
        };
        format!(
            "<t:ExchangeImpersonation><t:ConnectingSID><t:{tag}>{}</t:{tag}></t:ConnectingSID></t:ExchangeImpersonation>",
            xml_escape(value),
            tag = tag
        )
    }
}
