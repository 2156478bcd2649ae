//! Answer values collected from a form instance

use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Live record of collected values, keyed by field name.
///
/// An absent key means the field has no answer.
pub type AnswerMap = BTreeMap<String, AnswerValue>;

/// Dynamically-typed answer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Text and textarea input, select value
    Text(String),
    /// Numeric input
    Number(f64),
    /// Checkbox
    Bool(bool),
    /// Date, serialized as `YYYY-MM-DD`
    Date(NaiveDate),
    /// Multi-select values
    Choices(Vec<String>),
    /// Compact projection of a related record
    Record(RelatedRecord),
    /// Validated uploads
    Files(Vec<UploadedFile>),
}

impl AnswerValue {
    /// Text form used when comparing against a condition target
    pub fn condition_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => number_text(*n),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Choices(values) => values.join(","),
            Self::Record(record) => record.id.to_string(),
            Self::Files(files) => files
                .iter()
                .map(|f| f.filename.as_str())
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Whether the value counts as unanswered for a required field
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Choices(values) => values.is_empty(),
            Self::Files(files) => files.is_empty(),
            Self::Number(_) | Self::Bool(_) | Self::Date(_) | Self::Record(_) => false,
        }
    }
}

/// Decimal text of a number with at least one fractional digit (`2` is `"2.0"`).
/// Magnitudes outside `1e-3..1e7` use exponent form such as `"1.5E7"`.
fn number_text(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let magnitude = n.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        return if n.fract() == 0.0 { format!("{n:.1}") } else { n.to_string() };
    }
    let exp = format!("{n:e}");
    match exp.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => format!("{mantissa}E{exponent}"),
        Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
        None => exp,
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.condition_text())
    }
}

/// `{id, nom, prenom}` projection stored for lookup fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedRecord {
    /// Record identifier
    pub id: i64,
    /// Family name
    pub nom: String,
    /// Given name
    pub prenom: String,
}

/// Accepted upload, held in memory until the form is submitted or discarded
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Client file name
    pub filename: String,
    /// Declared MIME type
    pub content_type: String,
    /// Byte length
    pub size: usize,
    /// File bytes, base64 on the wire
    #[serde(rename = "base64Content", with = "base64_content")]
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Build a record from an upload
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            size: content.len(),
            content,
        }
    }

    /// Content encoded for transport
    pub fn base64_content(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.content)
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

mod base64_content {
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_text() {
        assert_eq!(AnswerValue::Text("yes".into()).condition_text(), "yes");
        assert_eq!(AnswerValue::Number(2.0).condition_text(), "2.0");
        assert_eq!(AnswerValue::Number(2.5).condition_text(), "2.5");
        assert_eq!(AnswerValue::Bool(true).condition_text(), "true");
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(AnswerValue::Date(date).condition_text(), "2024-03-07");
        assert_eq!(
            AnswerValue::Choices(vec!["a".into(), "b".into()]).condition_text(),
            "a,b"
        );
        let record = RelatedRecord { id: 42, nom: "ALAOUI".into(), prenom: "Sara".into() };
        assert_eq!(AnswerValue::Record(record).condition_text(), "42");
    }

    #[test]
    fn test_number_text() {
        assert_eq!(number_text(0.0), "0.0");
        assert_eq!(number_text(-3.0), "-3.0");
        assert_eq!(number_text(1500.25), "1500.25");
        assert_eq!(number_text(1e7), "1.0E7");
        assert_eq!(number_text(15_000_000.0), "1.5E7");
        assert_eq!(number_text(0.0001), "1.0E-4");
    }

    #[test]
    fn test_emptiness() {
        assert!(AnswerValue::Text("   ".into()).is_empty());
        assert!(AnswerValue::Files(vec![]).is_empty());
        assert!(!AnswerValue::Bool(false).is_empty());
        assert!(!AnswerValue::Number(0.0).is_empty());
    }

    #[test]
    fn test_untagged_serialization() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        assert_eq!(serde_json::to_value(AnswerValue::Date(date)).unwrap(), "2023-12-01");
        assert_eq!(serde_json::to_value(AnswerValue::Bool(false)).unwrap(), false);
        let record = RelatedRecord { id: 7, nom: "BENNANI".into(), prenom: "Omar".into() };
        assert_eq!(
            serde_json::to_value(AnswerValue::Record(record)).unwrap(),
            serde_json::json!({"id": 7, "nom": "BENNANI", "prenom": "Omar"})
        );
    }

    #[test]
    fn test_uploaded_file_wire_format() {
        let file = UploadedFile::new("scan.pdf", "application/pdf", b"%PDF".to_vec());
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "filename": "scan.pdf",
                "contentType": "application/pdf",
                "size": 4,
                "base64Content": "JVBERg=="
            })
        );

        let back: UploadedFile = serde_json::from_value(json).unwrap();
        assert_eq!(back, file);
        assert_eq!(file.base64_content(), "JVBERg==");
    }

    #[test]
    fn test_debug_hides_content() {
        let file = UploadedFile::new("a.png", "image/png", vec![0x89, 0x50, 0x4E, 0x47]);
        let debug = format!("{:?}", file);
        assert!(debug.contains("a.png"));
        assert!(!debug.contains("content:"));
    }
}
