//! SOAP transport.
//!
//! [`SoapTransport::invoke`] runs one authenticated POST against the session's
//! committed endpoint and classifies whatever comes back. It never decides
//! what a failure means for the run; that is up to the caller.

use crate::classifier::{classify, Verdict};
use crate::config::SettingsConfig;
use crate::error::{EwsError, TransportErrorKind};
use crate::parser::{parse_document, XmlDocument};
use crate::session::Session;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, warn};

/// Content type of every SOAP request.
pub const SOAP_CONTENT_TYPE: &str = "text/xml; charset=UTF-8";

/// A SOAP POST ready to be sent.
#[derive(Debug, Clone, Copy)]
pub struct SoapRequest<'a> {
    pub endpoint: &'a str,
    pub body: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP layer underneath [`SoapTransport`].
///
/// Failures are reported as [`EwsError::Transport`].
pub trait HttpTransport {
    /// Plain unauthenticated GET. Any HTTP status counts as reachable.
    fn probe(&self, endpoint: &str) -> Result<(), EwsError>;

    /// Authenticated SOAP POST. Non-2xx statuses are returned, not raised.
    fn post(&self, request: &SoapRequest<'_>) -> Result<HttpResponse, EwsError>;
}

/// [`HttpTransport`] backed by a blocking reqwest client.
///
/// Certificate verification is always on.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    probe_timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(settings: &SettingsConfig) -> Result<Self, EwsError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| EwsError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            probe_timeout: Duration::from_secs(settings.probe_timeout_secs),
        })
    }
}

impl HttpTransport for ReqwestTransport {
    fn probe(&self, endpoint: &str) -> Result<(), EwsError> {
        self.client
            .get(endpoint)
            .timeout(self.probe_timeout)
            .send()
            .map(|_| ())
            .map_err(|e| reqwest_error(&e))
    }

    fn post(&self, request: &SoapRequest<'_>) -> Result<HttpResponse, EwsError> {
        let response = self
            .client
            .post(request.endpoint)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .basic_auth(request.username, Some(request.password))
            .body(request.body.to_owned())
            .send()
            .map_err(|e| reqwest_error(&e))?;

        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| reqwest_error(&e))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn reqwest_error(err: &reqwest::Error) -> EwsError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connection
    } else if err.is_status() || err.is_redirect() || err.is_body() || err.is_decode() {
        TransportErrorKind::Http
    } else {
        TransportErrorKind::Other
    };

    let mut detail = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }

    EwsError::transport(kind, detail)
}

/// Classified result of one SOAP invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(XmlDocument),
    ProtocolError { code: String, message: String },
    TransportError { kind: TransportErrorKind, detail: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The response document on success, the failure as an error otherwise.
    pub fn into_result(self) -> Result<XmlDocument, EwsError> {
        match self {
            Self::Success(document) => Ok(document),
            Self::ProtocolError { code, message } => Err(EwsError::Protocol { code, message }),
            Self::TransportError { kind, detail } => Err(EwsError::Transport { kind, detail }),
        }
    }

    fn transport(kind: TransportErrorKind, detail: impl Into<String>) -> Self {
        Self::TransportError {
            kind,
            detail: detail.into(),
        }
    }
}

/// Executes SOAP requests and classifies their responses.
pub struct SoapTransport {
    http: Box<dyn HttpTransport>,
}

impl SoapTransport {
    pub fn new(http: Box<dyn HttpTransport>) -> Self {
        Self { http }
    }

    /// Transport backed by [`ReqwestTransport`].
    pub fn from_settings(settings: &SettingsConfig) -> Result<Self, EwsError> {
        Ok(Self::new(Box::new(ReqwestTransport::new(settings)?)))
    }

    /// Reachability check used before an autodiscover attempt.
    pub fn probe(&self, endpoint: &str) -> Result<(), EwsError> {
        self.http.probe(endpoint)
    }

    /// POST `soap_body` to the session's committed endpoint and classify the
    /// response.
    ///
    /// Only fails when the session has no committed endpoint; every request
    /// or response problem is reported through the returned [`Outcome`].
    pub fn invoke(&self, session: &Session, soap_body: &str) -> Result<Outcome, EwsError> {
        let endpoint = session.endpoint().ok_or(EwsError::NotNegotiated)?;
        let credentials = session.credentials();

        debug!(endpoint = %endpoint, body = %soap_body, "Sending SOAP request");

        let request = SoapRequest {
            endpoint,
            body: soap_body,
            username: &credentials.email_address,
            password: &credentials.password,
        };

        let outcome = match self.http.post(&request) {
            Ok(response) => classify_response(endpoint, &response),
            Err(EwsError::Transport { kind, detail }) => Outcome::TransportError { kind, detail },
            Err(other) => Outcome::transport(TransportErrorKind::Other, other.to_string()),
        };

        match &outcome {
            Outcome::Success(_) => {
                debug!(endpoint = %endpoint, "SOAP request succeeded");
            }
            Outcome::ProtocolError { code, message } => {
                warn!(
                    endpoint = %endpoint,
                    code = %code,
                    message = %message,
                    "EWS returned an error"
                );
            }
            Outcome::TransportError { kind, detail } => {
                warn!(
                    endpoint = %endpoint,
                    kind = %kind.as_str(),
                    detail = %detail,
                    "SOAP request failed"
                );
            }
        }

        Ok(outcome)
    }
}

fn classify_response(endpoint: &str, response: &HttpResponse) -> Outcome {
    debug!(
        endpoint = %endpoint,
        status = response.status,
        body = %String::from_utf8_lossy(&response.body),
        "Received SOAP response"
    );

    let document = match parse_document(&response.body) {
        Ok(document) => document,
        Err(reason) => {
            debug!(endpoint = %endpoint, reason = %reason, "Response is not XML");
            return if response.is_success() {
                Outcome::transport(TransportErrorKind::Other, "unparseable response")
            } else {
                Outcome::transport(
                    TransportErrorKind::Other,
                    format!("unparseable response (HTTP status {})", response.status),
                )
            };
        }
    };

    match classify(&document).verdict() {
        Verdict::Success => Outcome::Success(document),
        Verdict::Failure { code, message } => Outcome::ProtocolError { code, message },
        Verdict::Unrecognized if response.is_success() => {
            Outcome::transport(TransportErrorKind::Other, "unrecognized response shape")
        }
        Verdict::Unrecognized => {
            Outcome::transport(TransportErrorKind::Http, format!("HTTP status {}", response.status))
        }
    }
}
