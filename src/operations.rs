//! EWS operations.
//!
//! Every operation builds its own request body and extracts [`Record`]s from
//! a successful response; [`Operation::run`] ties both to a [`SoapTransport`].

pub mod get_searchable_mailboxes;
pub mod get_user_settings;

pub use get_searchable_mailboxes::GetSearchableMailboxes;
pub use get_user_settings::GetUserSettings;

use crate::config::{ExchangeVersion, FailAction};
use crate::error::EwsError;
use crate::parser::{XmlDocument, EWS_MESSAGES_NS, EWS_TYPES_NS, SOAP_11_NS};
use crate::session::Session;
use crate::transport::SoapTransport;
use std::collections::BTreeMap;
use tracing::{error, info};

/// Field name to value, produced from one element of a response.
pub type Record = BTreeMap<String, String>;

/// A single EWS request/response exchange.
pub trait Operation {
    /// Operation name, for logging.
    fn name(&self) -> &'static str;

    /// Request body for the session's committed version.
    fn build(&self, session: &Session) -> Result<String, EwsError>;

    /// Extract records from a successful response.
    ///
    /// `None` is a caller error and yields [`EwsError::EmptyResponse`].
    fn parse(&self, document: Option<&XmlDocument>) -> Result<Vec<Record>, EwsError>;

    /// Build, send and parse.
    ///
    /// A failed request is returned as an error under [`FailAction::Stop`] and
    /// yields no records under [`FailAction::Continue`].
    fn run(
        &self,
        transport: &SoapTransport,
        session: &Session,
        fail_action: FailAction,
    ) -> Result<Vec<Record>, EwsError> {
        let body = self.build(session)?;
        let outcome = transport.invoke(session, &body)?;

        match outcome.into_result() {
            Ok(document) => self.parse(Some(&document)),
            Err(err) => match fail_action {
                FailAction::Stop => {
                    error!(operation = self.name(), error = %err, "Operation failed");
                    Err(err)
                }
                FailAction::Continue => {
                    info!(operation = self.name(), error = %err, "Operation failed, continuing");
                    Ok(Vec::new())
                }
            },
        }
    }
}

/// Committed version of a session, required to build any request.
pub(crate) fn committed_version(session: &Session) -> Result<ExchangeVersion, EwsError> {
    session.version().ok_or(EwsError::NotNegotiated)
}

/// Wrap an EWS body element in a SOAP 1.1 envelope carrying the
/// `RequestServerVersion` header and any extra header content.
pub fn ews_envelope(version: ExchangeVersion, extra_header: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="{soap}"
               xmlns:t="{types}"
               xmlns:m="{messages}">
   <soap:Header>
      <t:RequestServerVersion Version="{version}" />
      {extra_header}
   </soap:Header>
   <soap:Body>
      {body}
   </soap:Body>
</soap:Envelope>"#,
        soap = SOAP_11_NS,
        types = EWS_TYPES_NS,
        messages = EWS_MESSAGES_NS,
        version = version.as_str(),
        extra_header = extra_header,
        body = body,
    )
}

/// Convert an element name to a record field name.
///
/// `ReferenceId` becomes `reference_id`. `UserDN` is special-cased to
/// `user_dn`.
pub fn camel_to_snake(name: &str) -> String {
    if name == "UserDN" {
        return "user_dn".to_string();
    }

    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_uppercase() {
            out.push('_');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out.trim_start_matches('_').to_string()
}
