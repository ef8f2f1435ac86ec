//! GetSearchableMailboxes: mailboxes the account may run eDiscovery searches on.

use super::{camel_to_snake, committed_version, ews_envelope, Operation, Record};
use crate::classifier::NO_ERROR;
use crate::error::{xml_escape, EwsError};
use crate::parser::XmlDocument;
use crate::session::Session;
use tracing::{debug, warn};

/// Child elements of `SearchableMailbox` copied into each record.
pub const MAILBOX_FIELDS: [&str; 7] = [
    "ReferenceId",
    "PrimarySmtpAddress",
    "DisplayName",
    "IsMembershipGroup",
    "IsExternalMailbox",
    "ExternalEmailAddress",
    "Guid",
];

/// Lists the mailboxes visible to the authenticated account.
#[derive(Debug, Clone)]
pub struct GetSearchableMailboxes {
    /// Expand distribution groups into their member mailboxes
    pub expand_group_membership: bool,
    /// Restrict results to mailboxes whose name or address starts with this
    pub search_filter: Option<String>,
}

impl Default for GetSearchableMailboxes {
    fn default() -> Self {
        Self {
            expand_group_membership: true,
            search_filter: None,
        }
    }
}

impl GetSearchableMailboxes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_filter(mut self, filter: impl Into<String>) -> Self {
        self.search_filter = Some(filter.into());
        self
    }
}

impl Operation for GetSearchableMailboxes {
    fn name(&self) -> &'static str {
        "GetSearchableMailboxes"
    }

    fn build(&self, session: &Session) -> Result<String, EwsError> {
        let version = committed_version(session)?;

        let filter = self
            .search_filter
            .as_deref()
            .map(|f| format!("<m:SearchFilter>{}</m:SearchFilter>", xml_escape(f)))
            .unwrap_or_default();

        let body = format!(
            "<m:GetSearchableMailboxes>{}<m:ExpandGroupMembership>{}</m:ExpandGroupMembership></m:GetSearchableMailboxes>",
            filter, self.expand_group_membership
        );

        Ok(ews_envelope(version, session.impersonation_header(), &body))
    }

    fn parse(&self, document: Option<&XmlDocument>) -> Result<Vec<Record>, EwsError> {
        let document = document.ok_or(EwsError::EmptyResponse)?;

        let response_code = document.find_text("ResponseCode");
        if response_code != Some(NO_ERROR) {
            warn!(
                response_code = ?response_code,
                "GetSearchableMailboxes response is not NoError, no mailboxes read"
            );
            return Ok(Vec::new());
        }

        let records: Vec<Record> = document
            .find_all("SearchableMailbox")
            .into_iter()
            .map(|mailbox| {
                MAILBOX_FIELDS
                    .iter()
                    .map(|tag| {
                        let value = mailbox.find(tag).and_then(|e| e.text()).unwrap_or_default();
                        (camel_to_snake(tag), value.to_string())
                    })
                    .collect()
            })
            .collect();

        debug!(count = records.len(), "Parsed searchable mailboxes");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExchangeVersion, FailAction, Impersonation};
    use crate::error::TransportErrorKind;
    use crate::parser::parse_document;
    use crate::session::Credentials;
    use crate::transport::testing::ScriptedHttp;
    use crate::transport::SoapTransport;

    const ENDPOINT: &str = "https://mail.example.com/EWS/Exchange.asmx";

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Header>
    <h:ServerVersionInfo MajorVersion="15" MinorVersion="20" xmlns:h="http://schemas.microsoft.com/exchange/services/2006/types"/>
  </s:Header>
  <s:Body>
    <GetSearchableMailboxesResponse ResponseClass="Success" xmlns="http://schemas.microsoft.com/exchange/services/2006/messages">
      <ResponseCode>NoError</ResponseCode>
      <SearchableMailboxes>
        <SearchableMailbox xmlns="http://schemas.microsoft.com/exchange/services/2006/types">
          <Guid>8f4ae9c8-7a56-4b4c-9b3b-1e3c8f2a9d01</Guid>
          <PrimarySmtpAddress>alice@example.com</PrimarySmtpAddress>
          <IsExternalMailbox>false</IsExternalMailbox>
          <ExternalEmailAddress/>
          <DisplayName>Alice</DisplayName>
          <IsMembershipGroup>false</IsMembershipGroup>
          <ReferenceId>/o=ExchangeLabs/cn=Recipients/cn=alice</ReferenceId>
        </SearchableMailbox>
        <SearchableMailbox xmlns="http://schemas.microsoft.com/exchange/services/2006/types">
          <Guid>2b1d0c6e-44d1-4a8e-a0b5-5c2f6d7e8f90</Guid>
          <PrimarySmtpAddress>bob@example.com</PrimarySmtpAddress>
          <IsExternalMailbox>false</IsExternalMailbox>
          <ExternalEmailAddress/>
          <DisplayName>Bob</DisplayName>
          <IsMembershipGroup>false</IsMembershipGroup>
          <ReferenceId>/o=ExchangeLabs/cn=Recipients/cn=bob</ReferenceId>
        </SearchableMailbox>
      </SearchableMailboxes>
    </GetSearchableMailboxesResponse>
  </s:Body>
</s:Envelope>"#;

    fn session() -> Session {
        Session::with_endpoint(
            Credentials::new("user@example.com", "pw").unwrap(),
            ENDPOINT,
            ExchangeVersion::Office365,
        )
    }

    #[test]
    fn test_parse_mailboxes() {
        let doc = parse_document(RESPONSE.as_bytes()).unwrap();
        let records = GetSearchableMailboxes::new().parse(Some(&doc)).unwrap();

        assert_eq!(records.len(), 2);
        let alice = &records[0];
        assert_eq!(alice.len(), 7);
        assert_eq!(alice["reference_id"], "/o=ExchangeLabs/cn=Recipients/cn=alice");
        assert_eq!(alice["primary_smtp_address"], "alice@example.com");
        assert_eq!(alice["display_name"], "Alice");
        assert_eq!(alice["is_membership_group"], "false");
        assert_eq!(alice["is_external_mailbox"], "false");
        assert_eq!(alice["external_email_address"], "");
        assert_eq!(alice["guid"], "8f4ae9c8-7a56-4b4c-9b3b-1e3c8f2a9d01");
        assert_eq!(records[1]["display_name"], "Bob");
    }

    #[test]
    fn test_parse_absent_document() {
        let result = GetSearchableMailboxes::new().parse(None);
        assert!(matches!(result, Err(EwsError::EmptyResponse)));
    }

    #[test]
    fn test_parse_requires_no_error_response_code() {
        // Passes the transport's success rule (no ErrorCode) but is not NoError.
        let xml = r#"<Envelope><ResponseCode>ErrorAccessDenied</ResponseCode>
<SearchableMailbox><ReferenceId>x</ReferenceId></SearchableMailbox></Envelope>"#;
        let doc = parse_document(xml.as_bytes()).unwrap();
        assert!(GetSearchableMailboxes::new().parse(Some(&doc)).unwrap().is_empty());

        let doc = parse_document(b"<Envelope><ErrorCode>NoError</ErrorCode></Envelope>").unwrap();
        assert!(GetSearchableMailboxes::new().parse(Some(&doc)).unwrap().is_empty());
    }

    #[test]
    fn test_build_request() {
        let session = session()
            .with_impersonation_header(Impersonation::SmtpAddress("boss@example.com".to_string()).header());
        let xml = GetSearchableMailboxes::new()
            .with_search_filter("a&b")
            .build(&session)
            .unwrap();

        assert!(xml.contains(r#"Version="Office365""#));
        assert!(xml.contains("<t:PrimarySmtpAddress>boss@example.com</t:PrimarySmtpAddress>"));
        assert!(xml.contains("<m:SearchFilter>a&amp;b</m:SearchFilter>"));
        assert!(xml.contains("<m:ExpandGroupMembership>true</m:ExpandGroupMembership>"));
    }

    #[test]
    fn test_build_requires_committed_version() {
        let session = Session::new(
            Credentials::new("user@example.com", "pw").unwrap(),
            vec![ExchangeVersion::Office365],
            vec![ENDPOINT.to_string()],
        )
        .unwrap();
        assert!(matches!(
            GetSearchableMailboxes::new().build(&session),
            Err(EwsError::NotNegotiated)
        ));
    }

    #[test]
    fn test_run_success() {
        let transport = SoapTransport::new(Box::new(ScriptedHttp::new().respond(ENDPOINT, 200, RESPONSE)));
        let records = GetSearchableMailboxes::new()
            .run(&transport, &session(), FailAction::Stop)
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_run_failure_with_stop() {
        let transport = SoapTransport::new(Box::new(
            ScriptedHttp::new().fail(ENDPOINT, TransportErrorKind::Connection),
        ));
        let result = GetSearchableMailboxes::new().run(&transport, &session(), FailAction::Stop);
        assert!(matches!(
            result,
            Err(EwsError::Transport {
                kind: TransportErrorKind::Connection,
                ..
            })
        ));
    }

    #[test]
    fn test_run_failure_with_continue() {
        let transport = SoapTransport::new(Box::new(
            ScriptedHttp::new().fail(ENDPOINT, TransportErrorKind::Connection),
        ));
        let records = GetSearchableMailboxes::new()
            .run(&transport, &session(), FailAction::Continue)
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_run_protocol_error_with_stop() {
        let fault = "<Envelope><Fault><faultcode>a:ErrorAccessDenied</faultcode><faultstring>denied</faultstring></Fault></Envelope>";
        let transport = SoapTransport::new(Box::new(ScriptedHttp::new().respond(ENDPOINT, 500, fault)));
        let result = GetSearchableMailboxes::new().run(&transport, &session(), FailAction::Stop);
        match result {
            Err(EwsError::Protocol { code, message }) => {
                assert_eq!(code, "a:ErrorAccessDenied");
                assert_eq!(message, "denied");
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }
}
