//! Sign command implementation.

use crate::CredentialArgs;
use vvtv_auth::{sign_request, unix_now, AUTHORIZATION_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Returns the header lines for a signed request.
pub fn header_lines(
    method: &str,
    path: &str,
    body: &[u8],
    timestamp: Option<String>,
    credential: CredentialArgs,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let credential = credential.resolve()?;
    let timestamp = timestamp.unwrap_or_else(|| unix_now().to_string());
    let headers = sign_request(&credential, method, path, &timestamp, body);

    Ok(vec![
        format!("{AUTHORIZATION_HEADER}: {}", headers.authorization),
        format!("{TIMESTAMP_HEADER}: {}", headers.timestamp),
        format!("{SIGNATURE_HEADER}: {}", headers.signature),
    ])
}

/// Runs the sign command.
pub fn run(
    method: &str,
    path: &str,
    body: &[u8],
    timestamp: Option<String>,
    credential: CredentialArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    for line in header_lines(method, path, body, timestamp, credential)? {
        println!("{line}");
    }
    Ok(())
}
