//! Candidate autodiscover endpoints.

use crate::error::EwsError;

/// Office 365 autodiscover endpoints, tried before the domain's own.
pub const OFFICE365_ENDPOINTS: [&str; 2] = [
    "https://outlook.office365.com/autodiscover/autodiscover.svc",
    "https://autodiscover-s.outlook.com/autodiscover/autodiscover.svc",
];

/// Ordered, de-duplicated candidate autodiscover endpoints for a domain.
pub fn autodiscover_endpoints(domain: &str) -> Result<Vec<String>, EwsError> {
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() || domain.contains(['/', '@', ' ']) {
        return Err(EwsError::Config(format!("invalid mail domain '{}'", domain)));
    }

    let mut endpoints: Vec<String> = OFFICE365_ENDPOINTS.iter().map(|e| e.to_string()).collect();
    for candidate in [
        format!("https://{}/autodiscover/autodiscover.svc", domain),
        format!("https://autodiscover.{}/autodiscover/autodiscover.svc", domain),
    ] {
        if !endpoints.contains(&candidate) {
            endpoints.push(candidate);
        }
    }
    Ok(endpoints)
}
