//! Benchmark utilities.

#![warn(missing_docs)]

/// Builds a daily report payload of roughly `size` bytes.
pub fn daily_report(date: &str, size: usize) -> Vec<u8> {
    let prefix = format!(r#"{{"date":"{date}","pad":""#);
    let pad = size.saturating_sub(prefix.len() + 2);
    let mut payload = prefix.into_bytes();
    payload.extend((0..pad).map(|i| b'a' + (i % 26) as u8));
    payload.extend_from_slice(br#""}"#);
    payload
}

/// Generates `count` distinct dates, cycling through days of 2024.
pub fn dates(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{}-{:02}-{:02}", 2024 + i / 336, (i / 28) % 12 + 1, i % 28 + 1))
        .collect()
}
