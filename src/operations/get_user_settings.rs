//! GetUserSettings: the autodiscover request used to validate a candidate
//! endpoint and version.

use super::{camel_to_snake, committed_version, Operation, Record};
use crate::classifier::NO_ERROR;
use crate::error::{xml_escape, EwsError};
use crate::parser::{XmlDocument, AUTODISCOVER_NS, SOAP_11_NS, WSA_NS};
use crate::session::Session;
use tracing::{debug, warn};

const ACTION: &str = "http://schemas.microsoft.com/exchange/2010/Autodiscover/Autodiscover/GetUserSettings";

/// Settings requested when none are configured.
pub const DEFAULT_SETTINGS: [&str; 10] = [
    "UserDisplayName",
    "UserDN",
    "UserDeploymentId",
    "InternalMailboxServer",
    "MailboxDN",
    "ActiveDirectoryServer",
    "CasVersion",
    "EwsSupportedSchemas",
    "InternalEwsUrl",
    "ExternalEwsUrl",
];

/// Requests mailbox settings for the session's own address.
#[derive(Debug, Clone)]
pub struct GetUserSettings {
    pub settings: Vec<String>,
}

impl Default for GetUserSettings {
    fn default() -> Self {
        Self {
            settings: DEFAULT_SETTINGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GetUserSettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Operation for GetUserSettings {
    fn name(&self) -> &'static str {
        "GetUserSettings"
    }

    fn build(&self, session: &Session) -> Result<String, EwsError> {
        let version = committed_version(session)?;
        let endpoint = session.endpoint().ok_or(EwsError::NotNegotiated)?;

        let settings: String = self
            .settings
            .iter()
            .map(|s| format!("<a:Setting>{}</a:Setting>", xml_escape(s)))
            .collect();

        Ok(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:a="{autodiscover}"
               xmlns:wsa="{wsa}"
               xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
               xmlns:soap="{soap}"
               xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
   <soap:Header>
      <a:RequestedServerVersion>{version}</a:RequestedServerVersion>
      <wsa:Action>{action}</wsa:Action>
      <wsa:To>{to}</wsa:To>
      {impersonation}
   </soap:Header>
   <soap:Body>
      <a:GetUserSettingsRequestMessage>
         <a:Request>
            <a:Users>
               <a:User>
                  <a:Mailbox>{mailbox}</a:Mailbox>
               </a:User>
            </a:Users>
            <a:RequestedSettings>{settings}</a:RequestedSettings>
         </a:Request>
      </a:GetUserSettingsRequestMessage>
   </soap:Body>
</soap:Envelope>"#,
            autodiscover = AUTODISCOVER_NS,
            wsa = WSA_NS,
            soap = SOAP_11_NS,
            version = version.as_str(),
            action = ACTION,
            to = xml_escape(endpoint),
            impersonation = session.impersonation_header(),
            mailbox = xml_escape(&session.credentials().email_address),
            settings = settings,
        ))
    }

    fn parse(&self, document: Option<&XmlDocument>) -> Result<Vec<Record>, EwsError> {
        let document = document.ok_or(EwsError::EmptyResponse)?;

        // Only the response and user response codes decide; a UserSettingError
        // marks a single unavailable setting.
        let error_codes: Vec<&str> = document
            .find_all("Response")
            .into_iter()
            .chain(document.find_all("UserResponse"))
            .filter_map(|e| e.child("ErrorCode").and_then(|code| code.text()))
            .collect();
        if error_codes.is_empty() || error_codes.iter().any(|code| *code != NO_ERROR) {
            warn!(error_codes = ?error_codes, "GetUserSettings response is not NoError, no settings read");
            return Ok(Vec::new());
        }

        let record: Record = document
            .find_all("UserSetting")
            .into_iter()
            .filter_map(|setting| {
                let name = setting.child("Name").and_then(|e| e.text())?;
                let value = setting.child("Value").and_then(|e| e.text()).unwrap_or_default();
                Some((camel_to_snake(name), value.to_string()))
            })
            .collect();

        debug!(count = record.len(), "Parsed user settings");
        if record.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![record])
    }
}
