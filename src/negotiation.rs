//! Autodiscover negotiation.
//!
//! Tries every (version, endpoint) candidate of a session in declared order,
//! versions outermost, and settles on the first one where the bootstrap
//! operation succeeds and returns records. Each candidate is attempted at
//! most once per call. The session itself is never modified; the caller
//! applies the result with [`Session::commit`].

use crate::error::EwsError;
use crate::operations::{GetUserSettings, Operation, Record};
use crate::session::{Candidate, Session};
use crate::transport::{Outcome, SoapTransport};
use tracing::{debug, info, warn};

/// A candidate that passed the bootstrap operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    /// The winning version and endpoint
    pub candidate: Candidate,
    /// Records returned by the bootstrap operation
    pub records: Vec<Record>,
    /// Number of candidates considered, including the winner
    pub attempts: usize,
}

impl Negotiated {
    /// EWS URL reported by a GetUserSettings bootstrap, if any.
    pub fn ews_url(&self) -> Option<&str> {
        self.records
            .iter()
            .find_map(|record| record.get("external_ews_url"))
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }
}

/// Drives the bootstrap operation across a session's candidates.
pub struct NegotiationEngine<'a> {
    transport: &'a SoapTransport,
    bootstrap: Box<dyn Operation + 'a>,
}

impl<'a> NegotiationEngine<'a> {
    /// Engine using [`GetUserSettings`] as the bootstrap operation.
    pub fn new(transport: &'a SoapTransport) -> Self {
        Self {
            transport,
            bootstrap: Box::new(GetUserSettings::new()),
        }
    }

    /// Replace the bootstrap operation.
    pub fn with_bootstrap(mut self, bootstrap: impl Operation + 'a) -> Self {
        self.bootstrap = Box::new(bootstrap);
        self
    }

    /// Find the first working candidate.
    ///
    /// Returns [`EwsError::NoReachableEndpoint`] once every candidate has
    /// failed and [`EwsError::AlreadyNegotiated`] if the session already has
    /// a committed endpoint.
    pub fn discover(&self, session: &Session) -> Result<Negotiated, EwsError> {
        if session.is_committed() {
            return Err(EwsError::AlreadyNegotiated);
        }

        let candidates = session.candidates();
        info!(
            versions = ?session.candidate_versions(),
            endpoints = session.candidate_endpoints().len(),
            operation = self.bootstrap.name(),
            "Starting autodiscover"
        );

        for (index, candidate) in candidates.iter().enumerate() {
            if let Some(records) = self.attempt(session, candidate)? {
                info!(
                    version = %candidate.version,
                    endpoint = %candidate.endpoint,
                    attempts = index + 1,
                    "Autodiscover succeeded"
                );
                return Ok(Negotiated {
                    candidate: candidate.clone(),
                    records,
                    attempts: index + 1,
                });
            }
        }

        warn!(attempted = candidates.len(), "Autodiscover exhausted every candidate");
        Err(EwsError::NoReachableEndpoint {
            attempted: candidates.len(),
        })
    }

    /// One attempt. `Ok(None)` means the candidate failed and the next one
    /// should be tried.
    fn attempt(&self, session: &Session, candidate: &Candidate) -> Result<Option<Vec<Record>>, EwsError> {
        debug!(version = %candidate.version, endpoint = %candidate.endpoint, "Probing endpoint");

        if let Err(err) = self.transport.probe(&candidate.endpoint) {
            info!(
                version = %candidate.version,
                endpoint = %candidate.endpoint,
                error = %err,
                "Endpoint unreachable, skipping"
            );
            return Ok(None);
        }

        let trial = session.trial(candidate);
        let body = self.bootstrap.build(&trial)?;

        let reason = match self.transport.invoke(&trial, &body)? {
            Outcome::Success(document) => match self.bootstrap.parse(Some(&document)) {
                Ok(records) if !records.is_empty() => return Ok(Some(records)),
                Ok(_) => "response contained no records".to_string(),
                Err(err) => err.to_string(),
            },
            Outcome::ProtocolError { code, message } => format!("{}: {}", code, message),
            Outcome::TransportError { kind, detail } => format!("{}: {}", kind.as_str(), detail),
        };

        info!(
            version = %candidate.version,
            endpoint = %candidate.endpoint,
            reason = %reason,
            "Exchange version and endpoint not supported or errored"
        );
        Ok(None)
    }
}
