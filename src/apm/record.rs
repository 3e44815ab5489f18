//! Finished transaction and segment records handed to reporters.

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::apm::attributes::CustomAttributes;

/// Kind of work a transaction represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionCategory {
    /// Web-facing request handling.
    Web,
    /// Background or non-web work.
    Other,
}

impl TransactionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::Web => "web",
            TransactionCategory::Other => "other",
        }
    }
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished segment.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentRecord {
    pub name: String,
    /// Offset of the segment start from the transaction start.
    pub start_offset: Duration,
    pub duration: Duration,
    pub attributes: CustomAttributes,
    pub error: Option<String>,
}

impl SegmentRecord {
    /// Offset of the segment end from the transaction start.
    pub fn end_offset(&self) -> Duration {
        self.start_offset + self.duration
    }
}

/// A finished transaction with its segments in finish order.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRecord {
    pub name: String,
    pub category: TransactionCategory,
    pub started_at: SystemTime,
    pub duration: Duration,
    pub attributes: CustomAttributes,
    pub segments: Vec<SegmentRecord>,
    pub error: Option<String>,
}

impl TransactionRecord {
    pub fn segment(&self, name: &str) -> Option<&SegmentRecord> {
        self.segments.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_segments() {
        let mut attributes = CustomAttributes::new();
        attributes.insert("endpoint", "/foo");
        let mut segment_attributes = CustomAttributes::new();
        segment_attributes.insert("method", "GET");

        let record = TransactionRecord {
            name: "HTTP_GET".into(),
            category: TransactionCategory::Web,
            started_at: SystemTime::UNIX_EPOCH,
            duration: Duration::from_millis(5),
            attributes,
            segments: vec![SegmentRecord {
                name: "ProcessRequest".into(),
                start_offset: Duration::from_millis(1),
                duration: Duration::from_millis(2),
                attributes: segment_attributes,
                error: None,
            }],
            error: None,
        };

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["name"], "HTTP_GET");
        assert_eq!(json["category"], "web");
        assert_eq!(json["attributes"]["endpoint"], "/foo");
        assert_eq!(json["segments"][0]["name"], "ProcessRequest");
        assert_eq!(json["segments"][0]["attributes"]["method"], "GET");
        assert!(json["error"].is_null());
    }
}
