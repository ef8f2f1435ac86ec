//! Exchange Web Services SOAP client
//!
//! Finds a working EWS endpoint and protocol version for an account through
//! autodiscover negotiation, then runs EWS operations against it with uniform
//! transport and error handling.
//!
//! # Features
//!
//! - Autodiscover over ordered (version, endpoint) candidates, first match wins
//! - Depth-agnostic response classification (`ResponseCode`, `ErrorCode`, SOAP faults)
//! - Blocking HTTP transport with basic auth and mandatory TLS verification
//! - Per-operation fail policy: stop on the first error or continue without records
//! - Optional Exchange impersonation
//!
//! # Example
//!
//! ```ignore
//! use ews_soap_client::{ClientConfig, GetSearchableMailboxes, NegotiationEngine, Operation, Session, SoapTransport};
//!
//! let config = ClientConfig::load("config.yaml".as_ref())?;
//! let transport = SoapTransport::from_settings(&config.settings)?;
//! let mut session = Session::from_config(&config)?;
//! if !session.is_committed() {
//!     let negotiated = NegotiationEngine::new(&transport).discover(&session)?;
//!     session = session.commit(&negotiated)?;
//! }
//! let mailboxes = GetSearchableMailboxes::new().run(&transport, &session, config.settings.fail_action)?;
//! ```

pub mod classifier;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod negotiation;
pub mod operations;
pub mod parser;
pub mod session;
pub mod transport;

pub use config::{ClientConfig, ExchangeVersion, FailAction, Impersonation};
pub use error::{EwsError, TransportErrorKind};
pub use negotiation::{NegotiationEngine, Negotiated};
pub use operations::{GetSearchableMailboxes, GetUserSettings, Operation, Record};
pub use session::{Credentials, Session};
pub use transport::{HttpTransport, Outcome, ReqwestTransport, SoapTransport};
