//! Snapshot kinds and keys.

use std::fmt;

/// The three record kinds held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SnapshotKind {
    /// Singleton pipeline status.
    Status = 1,
    /// Report keyed by `date`.
    Daily = 2,
    /// Report keyed by `week`.
    Weekly = 3,
}

impl SnapshotKind {
    /// All kinds, in log byte order.
    pub const ALL: [Self; 3] = [Self::Status, Self::Daily, Self::Weekly];

    /// Converts a log byte to a kind.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Status),
            2 => Some(Self::Daily),
            3 => Some(Self::Weekly),
            _ => None,
        }
    }

    /// Converts the kind to its log byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Lowercase name used in routes and responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Parses a route segment (`status`, `daily`, `weekly`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "status" => Some(Self::Status),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }

    /// Payload field holding the storage key, if the kind is keyed.
    #[must_use]
    pub const fn key_field(self) -> Option<&'static str> {
        match self {
            Self::Status => None,
            Self::Daily => Some("date"),
            Self::Weekly => Some("week"),
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage key of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SnapshotKey {
    /// The singleton status row.
    Status,
    /// A daily report.
    Daily(String),
    /// A weekly report.
    Weekly(String),
}

impl SnapshotKey {
    /// Builds a key from its parts. `id` is ignored for status.
    #[must_use]
    pub fn new(kind: SnapshotKind, id: impl Into<String>) -> Self {
        match kind {
            SnapshotKind::Status => Self::Status,
            SnapshotKind::Daily => Self::Daily(id.into()),
            SnapshotKind::Weekly => Self::Weekly(id.into()),
        }
    }

    /// Returns the kind.
    #[must_use]
    pub fn kind(&self) -> SnapshotKind {
        match self {
            Self::Status => SnapshotKind::Status,
            Self::Daily(_) => SnapshotKind::Daily,
            Self::Weekly(_) => SnapshotKind::Weekly,
        }
    }

    /// Returns the date/week, or `""` for status.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Status => "",
            Self::Daily(id) | Self::Weekly(id) => id,
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => f.write_str("status"),
            Self::Daily(id) | Self::Weekly(id) => write!(f, "{}:{id}", self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        for kind in SnapshotKind::ALL {
            assert_eq!(SnapshotKind::from_byte(kind.as_byte()), Some(kind));
            assert_eq!(SnapshotKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(SnapshotKind::from_byte(0), None);
        assert_eq!(SnapshotKind::from_name("monthly"), None);
    }

    #[test]
    fn status_key_ignores_id() {
        assert_eq!(SnapshotKey::new(SnapshotKind::Status, "x"), SnapshotKey::Status);
        assert_eq!(SnapshotKey::Status.id(), "");
    }

    #[test]
    fn key_display() {
        assert_eq!(SnapshotKey::Daily("2024-01-01".into()).to_string(), "daily:2024-01-01");
        assert_eq!(SnapshotKey::Status.to_string(), "status");
    }
}
