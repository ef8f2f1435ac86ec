//! Response classification.
//!
//! EWS signals success and failure inconsistently across operations: regular
//! EWS responses carry `ResponseCode`, autodiscover responses carry
//! `ErrorCode`, and SOAP faults carry `faultcode`/`faultstring`. The markers
//! also appear at different nesting depths, so every lookup searches the
//! whole document and takes the first match in document order.

use crate::parser::XmlDocument;

/// The canonical "no error" marker.
pub const NO_ERROR: &str = "NoError";
/// Code reported when a failed response names no error code.
pub const UNKNOWN_ERROR_CODE: &str = "<UNKNOWN>";

/// Error code elements, highest priority first.
const ERROR_CODE_TAGS: [&str; 2] = ["ErrorCode", "faultcode"];
/// Diagnostic message elements, highest priority first.
const MESSAGE_TAGS: [&str; 3] = ["MessageText", "ErrorMessage", "faultstring"];

/// Status markers extracted from a response document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// First `ResponseCode` in the document
    pub response_code: Option<String>,
    /// First of `ErrorCode`, `faultcode`
    pub error_code: Option<String>,
    /// First of `MessageText`, `ErrorMessage`, `faultstring`; empty when none
    pub message: String,
}

/// Verdict derived from a [`Classification`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure { code: String, message: String },
    /// No status marker of any kind was found
    Unrecognized,
}

impl Classification {
    /// The request succeeded when the response code is `NoError`, or when the
    /// error code is absent or `NoError`.
    pub fn is_success(&self) -> bool {
        self.response_code.as_deref() == Some(NO_ERROR)
            || matches!(self.error_code.as_deref(), None | Some(NO_ERROR))
    }

    /// Map the extracted markers to a verdict.
    pub fn verdict(&self) -> Verdict {
        if self.response_code.is_none() && self.error_code.is_none() {
            return Verdict::Unrecognized;
        }
        if self.is_success() {
            return Verdict::Success;
        }
        Verdict::Failure {
            code: self
                .error_code
                .clone()
                .unwrap_or_else(|| UNKNOWN_ERROR_CODE.to_string()),
            message: self.message.clone(),
        }
    }
}

/// Extract the status markers from a parsed response.
pub fn classify(document: &XmlDocument) -> Classification {
    Classification {
        response_code: document.find_text("ResponseCode").map(String::from),
        error_code: first_text(document, &ERROR_CODE_TAGS),
        message: first_text(document, &MESSAGE_TAGS).unwrap_or_default(),
    }
}

fn first_text(document: &XmlDocument, tags: &[&str]) -> Option<String> {
    tags.iter()
        .find_map(|tag| document.find_text(tag))
        .map(String::from)
}
