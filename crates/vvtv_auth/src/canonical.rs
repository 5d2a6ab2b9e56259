//! Canonical request encoding.

const SEPARATOR: u8 = b'\n';

/// Builds the signing input for a request.
///
/// The four fields are joined by a single `\n` with no escaping, so the
/// output is `method \n path \n timestamp \n body`. `timestamp` must be
/// the header value exactly as received; re-formatting a parsed number
/// (`"01700000000"` vs `"1700000000"`) yields a different string.
#[must_use]
pub fn canonical_string(method: &str, path: &str, timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(method.len() + path.len() + timestamp.len() + body.len() + 3);
    buf.extend_from_slice(method.as_bytes());
    buf.push(SEPARATOR);
    buf.extend_from_slice(path.as_bytes());
    buf.push(SEPARATOR);
    buf.extend_from_slice(timestamp.as_bytes());
    buf.push(SEPARATOR);
    buf.extend_from_slice(body);
    buf
}
