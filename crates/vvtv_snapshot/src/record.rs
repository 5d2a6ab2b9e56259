//! Log record framing.
//!
//! ```text
//! record_len u32 | kind u8 | key_len u16 | key | updated_at u64 | payload | crc32 u32
//! ```
//!
//! Integers are little-endian. `record_len` counts the whole record,
//! itself included. The CRC covers every byte before it.

use crate::error::{SnapshotError, SnapshotResult};
use crate::kind::{SnapshotKey, SnapshotKind};

/// record_len (4) + kind (1) + key_len (2) + updated_at (8).
const FIXED_HEADER: usize = 15;
const CRC_SIZE: usize = 4;
const MIN_RECORD: usize = FIXED_HEADER + CRC_SIZE;

/// One upsert as written to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SnapshotRecord {
    pub key: SnapshotKey,
    pub updated_at: u64,
    pub payload: String,
}

/// Result of decoding at an offset.
#[derive(Debug)]
pub(crate) enum Decoded {
    /// A complete, valid record and its encoded length.
    Record(SnapshotRecord, usize),
    /// The bytes at the offset end before the record does, or the final
    /// record fails its checksum: a crash mid-append.
    TornTail,
}

impl SnapshotRecord {
    /// Encodes the record.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the key or record exceeds the field
    /// widths of the format.
    pub fn encode(&self) -> SnapshotResult<Vec<u8>> {
        let key = self.key.id().as_bytes();
        let key_len = u16::try_from(key.len()).map_err(|_| {
            SnapshotError::validation(format!("{} key too long: {} bytes", self.key.kind(), key.len()))
        })?;

        let record_len = FIXED_HEADER + key.len() + self.payload.len() + CRC_SIZE;
        let record_len_u32 = u32::try_from(record_len).map_err(|_| {
            SnapshotError::validation(format!("payload too large: {} bytes", self.payload.len()))
        })?;

        let mut buf = Vec::with_capacity(record_len);
        buf.extend_from_slice(&record_len_u32.to_le_bytes());
        buf.push(self.key.kind().as_byte());
        buf.extend_from_slice(&key_len.to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&self.updated_at.to_le_bytes());
        buf.extend_from_slice(self.payload.as_bytes());

        let crc = compute_crc32(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());

        Ok(buf)
    }

    /// Decodes the record starting at `offset` in `log`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Corrupted`] for damage that cannot be
    /// explained by an interrupted final append.
    pub fn decode_at(log: &[u8], offset: usize) -> SnapshotResult<Decoded> {
        let data = &log[offset..];
        let at = offset as u64;

        let Some(len_bytes) = data.get(..4) else {
            return Ok(Decoded::TornTail);
        };
        let record_len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
        if record_len > data.len() {
            return torn_tail_or_corrupted(data, at, || {
                format!("record length {record_len} overruns log end")
            });
        }
        let is_last = record_len == data.len();
        if record_len < MIN_RECORD {
            return if is_last {
                Ok(Decoded::TornTail)
            } else {
                Err(SnapshotError::corrupted(at, format!("record length {record_len} too short")))
            };
        }

        let record = &data[..record_len];
        let body_end = record_len - CRC_SIZE;
        let stored_crc = u32::from_le_bytes([
            record[body_end],
            record[body_end + 1],
            record[body_end + 2],
            record[body_end + 3],
        ]);
        let computed_crc = compute_crc32(&record[..body_end]);
        if stored_crc != computed_crc {
            return if is_last {
                torn_tail_or_corrupted(data, at, || "checksum mismatch on final record".to_string())
            } else {
                Err(SnapshotError::corrupted(
                    at,
                    format!("checksum mismatch: stored {stored_crc:#010x}, computed {computed_crc:#010x}"),
                ))
            };
        }

        let kind = SnapshotKind::from_byte(record[4])
            .ok_or_else(|| SnapshotError::corrupted(at, format!("unknown kind byte {}", record[4])))?;
        let key_len = u16::from_le_bytes([record[5], record[6]]) as usize;
        let key_end = 7 + key_len;
        if key_end + 8 > body_end {
            return Err(SnapshotError::corrupted(at, "key length exceeds record"));
        }
        let id = std::str::from_utf8(&record[7..key_end])
            .map_err(|_| SnapshotError::corrupted(at, "key is not UTF-8"))?;

        let mut ts = [0u8; 8];
        ts.copy_from_slice(&record[key_end..key_end + 8]);
        let updated_at = u64::from_le_bytes(ts);

        let payload = std::str::from_utf8(&record[key_end + 8..body_end])
            .map_err(|_| SnapshotError::corrupted(at, "payload is not UTF-8"))?;

        Ok(Decoded::Record(
            Self {
                key: SnapshotKey::new(kind, id),
                updated_at,
                payload: payload.to_string(),
            },
            record_len,
        ))
    }
}

/// Classifies a record that cannot be read to the end of `data`.
///
/// An interrupted append leaves only a prefix of one record, so no
/// complete record can start inside it. If one does, the bytes at the
/// offset are damaged and truncating there would drop live records.
fn torn_tail_or_corrupted(
    data: &[u8],
    at: u64,
    describe: impl FnOnce() -> String,
) -> SnapshotResult<Decoded> {
    match (1..data.len()).find(|&start| is_complete_record(&data[start..])) {
        None => Ok(Decoded::TornTail),
        Some(start) => Err(SnapshotError::corrupted(
            at,
            format!("{}; valid record follows at offset {}", describe(), at + start as u64),
        )),
    }
}

/// True if `data` starts with a length-framed record whose checksum and
/// kind byte are valid.
fn is_complete_record(data: &[u8]) -> bool {
    let Some(len_bytes) = data.get(..4) else {
        return false;
    };
    let record_len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    if record_len < MIN_RECORD || record_len > data.len() {
        return false;
    }
    if SnapshotKind::from_byte(data[4]).is_none() {
        return false;
    }
    let body_end = record_len - CRC_SIZE;
    let stored_crc = u32::from_le_bytes([
        data[body_end],
        data[body_end + 1],
        data[body_end + 2],
        data[body_end + 3],
    ]);
    stored_crc == compute_crc32(&data[..body_end])
}

/// CRC32 (IEEE polynomial).
pub(crate) fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}
