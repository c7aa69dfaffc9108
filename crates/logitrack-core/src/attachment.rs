use std::fmt;
use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MaterializeError, ValidationError};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_CONTENT_TYPE: &str = "application/vnd.ms-excel";

/// Largest file accepted by the upload intake.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// A spreadsheet binary tagged with its content type and display filename.
///
/// The bytes are always a complete document; nothing in this crate edits them
/// in place.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    bytes: Bytes,
    content_type: String,
    filename: String,
}

impl Attachment {
    /// Wrap freshly produced spreadsheet bytes (e.g. an encoder's output).
    pub fn new(bytes: impl Into<Bytes>, filename: &str) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: XLSX_CONTENT_TYPE.to_string(),
            filename: filename.to_string(),
        }
    }

    /// Accept a user-picked file, enforcing the same intake rules as the
    /// dashboard's file picker: Excel content types only, at most 5 MiB.
    pub fn from_upload(
        bytes: impl Into<Bytes>,
        filename: &str,
        content_type: &str,
    ) -> Result<Self, ValidationError> {
        let bytes = bytes.into();
        if content_type != XLSX_CONTENT_TYPE && content_type != XLS_CONTENT_TYPE {
            return Err(ValidationError::InvalidFileType(content_type.to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ValidationError::FileTooLarge {
                size: bytes.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok(Self {
            bytes,
            content_type: content_type.to_string(),
            filename: filename.to_string(),
        })
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Inverse of [`materialize`]: the bytes to put in a multipart body.
    pub fn extract_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Map a file extension to the content type the upload intake expects.
pub fn content_type_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("xlsx") => XLSX_CONTENT_TYPE,
        Some("xls") => XLS_CONTENT_TYPE,
        _ => "application/octet-stream",
    }
}

/// JSON shape of a Node `Buffer`, as the backend transports attachment bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferJson {
    #[serde(rename = "type", default = "buffer_tag")]
    pub kind: String,
    pub data: Vec<u8>,
}

fn buffer_tag() -> String {
    "Buffer".to_string()
}

impl BufferJson {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            kind: buffer_tag(),
            data,
        }
    }
}

/// Wrap a server-delivered byte array into an [`Attachment`].
///
/// Accepts either `{ "data": [..] }` or a bare array of byte values. A
/// falsy `declared_filename` falls back to `default_filename`. Callers must
/// handle `null` themselves; it is rejected here like any other non-array.
pub fn materialize(
    source: &Value,
    declared_filename: Option<&str>,
    default_filename: &str,
) -> Result<Attachment, MaterializeError> {
    let values = match source {
        Value::Array(values) => values,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(values)) => values,
            _ => return Err(MaterializeError::NotByteArray(describe(source))),
        },
        other => return Err(MaterializeError::NotByteArray(describe(other))),
    };

    let mut bytes = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        let byte = value
            .as_u64()
            .filter(|b| *b <= u8::MAX as u64)
            .ok_or_else(|| MaterializeError::ByteOutOfRange {
                index,
                value: value.to_string(),
            })?;
        bytes.push(byte as u8);
    }

    let filename = match declared_filename {
        Some(name) if !name.is_empty() => name,
        _ => default_filename,
    };
    Ok(Attachment::new(bytes, filename))
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "boolean".into(),
        Value::Number(_) => "number".into(),
        Value::String(_) => "string".into(),
        Value::Array(_) => "array".into(),
        Value::Object(_) => "object without a data array".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn materialize_preserves_bytes() {
        let raw = vec![80u8, 75, 3, 4, 0, 255, 10];
        let source = serde_json::to_value(BufferJson::new(raw.clone())).unwrap();
        let att = materialize(&source, Some("a.xlsx"), "file.xlsx").unwrap();
        assert_eq!(att.extract_bytes().as_ref(), raw.as_slice());
        assert_eq!(att.filename(), "a.xlsx");
        assert_eq!(att.content_type(), XLSX_CONTENT_TYPE);
    }

    #[test]
    fn materialize_accepts_bare_array() {
        let att = materialize(&json!([1, 2, 3]), None, "file.xlsx").unwrap();
        assert_eq!(att.bytes().as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn falsy_filename_uses_default() {
        let src = json!({ "data": [] });
        assert_eq!(
            materialize(&src, None, "customer_data.xlsx").unwrap().filename(),
            "customer_data.xlsx"
        );
        assert_eq!(
            materialize(&src, Some(""), "summary_data.xlsx").unwrap().filename(),
            "summary_data.xlsx"
        );
    }

    #[test]
    fn materialize_rejects_non_arrays() {
        assert!(matches!(
            materialize(&Value::Null, None, "file.xlsx"),
            Err(MaterializeError::NotByteArray(s)) if s == "null"
        ));
        assert!(matches!(
            materialize(&json!({ "data": "abc" }), None, "file.xlsx"),
            Err(MaterializeError::NotByteArray(_))
        ));
        assert!(matches!(
            materialize(&json!("UEsDBA=="), None, "file.xlsx"),
            Err(MaterializeError::NotByteArray(_))
        ));
    }

    #[test]
    fn materialize_rejects_values_outside_byte_range() {
        let err = materialize(&json!([1, 256]), None, "file.xlsx").unwrap_err();
        assert_eq!(
            err,
            MaterializeError::ByteOutOfRange {
                index: 1,
                value: "256".into()
            }
        );
        assert!(materialize(&json!([-1]), None, "file.xlsx").is_err());
        assert!(materialize(&json!([1.5]), None, "file.xlsx").is_err());
    }

    #[test]
    fn upload_intake_checks_type_and_size() {
        assert!(Attachment::from_upload(vec![1, 2], "a.xlsx", XLSX_CONTENT_TYPE).is_ok());
        assert!(Attachment::from_upload(vec![1, 2], "a.xls", XLS_CONTENT_TYPE).is_ok());
        assert_eq!(
            Attachment::from_upload(vec![1], "a.csv", "text/csv").unwrap_err(),
            ValidationError::InvalidFileType("text/csv".into())
        );
        let big = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(
            Attachment::from_upload(big, "big.xlsx", XLSX_CONTENT_TYPE),
            Err(ValidationError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for_path(Path::new("x/Report.XLSX")), XLSX_CONTENT_TYPE);
        assert_eq!(content_type_for_path(Path::new("old.xls")), XLS_CONTENT_TYPE);
        assert_eq!(
            content_type_for_path(Path::new("notes.txt")),
            "application/octet-stream"
        );
    }
}
