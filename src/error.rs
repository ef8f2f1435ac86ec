//! Error types for the EWS client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// EWS client errors.
#[derive(Error, Debug)]
pub enum EwsError {
    #[error("transport error ({}): {detail}", kind.as_str())]
    Transport {
        kind: TransportErrorKind,
        detail: String,
    },

    #[error("EWS error '{code}': {message}")]
    Protocol { code: String, message: String },

    #[error("no reachable endpoint: all {attempted} version/endpoint combinations failed")]
    NoReachableEndpoint { attempted: usize },

    #[error("empty response")]
    EmptyResponse,

    #[error("session has no committed endpoint; run autodiscover or set an explicit EWS URL")]
    NotNegotiated,

    #[error("session already has a committed endpoint")]
    AlreadyNegotiated,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl EwsError {
    pub fn transport(kind: TransportErrorKind, detail: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            detail: detail.into(),
        }
    }

    pub fn protocol(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Category of a request-layer failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportErrorKind {
    /// The server answered, but not with something usable (status, body decoding)
    Http,
    /// Connection refused, DNS failure, TLS handshake failure
    Connection,
    /// Connect or read deadline exceeded
    Timeout,
    /// Anything else, including unparseable or unrecognized responses
    Other,
}

impl TransportErrorKind {
    /// Get the string code for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::Connection => "CONNECTION",
            Self::Timeout => "TIMEOUT",
            Self::Other => "OTHER",
        }
    }
}

/// Escape text for inclusion in element content or attribute values.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
