//! Submission encoder — turns a committed operator draft into a multipart payload.
//!
//! Every draft field goes through [`ENCODING_TABLE`]. A field with no entry,
//! or whose value does not match its entry, is an [`EncodeError`] rather
//! than being dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{ImageRef, OperatorDraft};
use crate::error::EncodeError;

/// Content type for every uploaded image part.
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Device platform, which decides how local file URIs are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Ios,
    #[default]
    Android,
}

impl Platform {
    /// iOS uploads want a bare path; Android keeps the `file://` scheme.
    pub fn normalize_uri<'a>(&self, uri: &'a str) -> &'a str {
        match self {
            Self::Ios => uri.strip_prefix("file://").unwrap_or(uri),
            Self::Android => uri,
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// How a draft field is written into the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEncoding {
    /// Stringified scalar.
    Text,
    /// JSON-serialized into one text field, skipped when empty.
    JsonList,
    /// File part for local images, omitted for remote ones.
    Image,
    /// Text, but only when editing an existing operator.
    EditOnly,
}

/// One row per draft field. Adding a field to the draft means adding it here.
pub const ENCODING_TABLE: &[(&str, FieldEncoding)] = &[
    ("id_operator", FieldEncoding::EditOnly),
    ("first_name", FieldEncoding::Text),
    ("last_name", FieldEncoding::Text),
    ("birth_date", FieldEncoding::Text),
    ("type_id", FieldEncoding::Text),
    ("id_number", FieldEncoding::Text),
    ("address", FieldEncoding::Text),
    ("phone", FieldEncoding::Text),
    ("email", FieldEncoding::Text),
    ("number_licence", FieldEncoding::Text),
    ("zipcode", FieldEncoding::Text),
    ("has_minors", FieldEncoding::Text),
    ("n_children", FieldEncoding::Text),
    ("sons", FieldEncoding::JsonList),
    ("license_front", FieldEncoding::Image),
    ("license_back", FieldEncoding::Image),
    ("code", FieldEncoding::Text),
    ("salary", FieldEncoding::Text),
    ("size_t_shift", FieldEncoding::Text),
    ("name_t_shift", FieldEncoding::Text),
    ("photo", FieldEncoding::Image),
    ("status", FieldEncoding::Text),
];

fn encoding_for(field: &str) -> Option<FieldEncoding> {
    ENCODING_TABLE
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, enc)| *enc)
}

/// A draft field value before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Unset; never written.
    Absent,
    Scalar(String),
    List(serde_json::Value),
    Image(ImageRef),
}

fn scalar(s: &str) -> FieldValue {
    FieldValue::Scalar(s.to_string())
}

fn opt_scalar(s: &Option<String>) -> FieldValue {
    s.as_deref().map_or(FieldValue::Absent, scalar)
}

fn list<T: Serialize>(field: &str, value: &T) -> Result<FieldValue, EncodeError> {
    serde_json::to_value(value)
        .map(FieldValue::List)
        .map_err(|e| EncodeError::Serialization {
            field: field.to_string(),
            reason: e.to_string(),
        })
}

fn opt_image(i: &Option<ImageRef>) -> FieldValue {
    i.clone().map_or(FieldValue::Absent, FieldValue::Image)
}

impl OperatorDraft {
    /// Flatten the draft into `(field, value)` pairs for encoding.
    pub fn fields(&self) -> Result<Vec<(&'static str, FieldValue)>, EncodeError> {
        use FieldValue::*;

        let id = &self.identity;
        let dep = &self.dependents;
        let emp = &self.employment;

        Ok(vec![
            ("id_operator", self.id_operator.map_or(Absent, |v| Scalar(v.to_string()))),
            ("first_name", scalar(&id.first_name)),
            ("last_name", scalar(&id.last_name)),
            ("birth_date", scalar(&id.birth_date)),
            ("type_id", scalar(&id.type_id)),
            ("id_number", scalar(&id.id_number)),
            ("address", scalar(&id.address)),
            ("phone", scalar(&id.phone)),
            ("email", opt_scalar(&id.email)),
            ("number_licence", scalar(&dep.number_licence)),
            ("zipcode", opt_scalar(&dep.zipcode)),
            ("has_minors", Scalar(dep.has_minors.to_string())),
            ("n_children", Scalar(dep.n_children.to_string())),
            ("sons", list("sons", &dep.sons)?),
            ("license_front", opt_image(&dep.license_front)),
            ("license_back", opt_image(&dep.license_back)),
            ("code", scalar(&emp.code)),
            ("salary", scalar(emp.salary.trim())),
            ("size_t_shift", emp.size_t_shift.map_or(Absent, |v| Scalar(v.to_string()))),
            ("name_t_shift", scalar(&emp.name_t_shift)),
            ("photo", opt_image(&emp.photo)),
            ("status", emp.status.map_or(Absent, |v| Scalar(v.to_string()))),
        ])
    }
}

/// A single multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        /// Platform-normalized local URI.
        uri: String,
        file_name: String,
        content_type: String,
    },
}

impl PayloadPart {
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Encoded operator payload, ready for the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPayload {
    pub parts: Vec<PayloadPart>,
}

impl MultipartPayload {
    /// Value of a text part.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            PayloadPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// A file part by field name.
    pub fn file(&self, name: &str) -> Option<&PayloadPart> {
        self.parts
            .iter()
            .find(|p| matches!(p, PayloadPart::File { name: n, .. } if n == name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name() == name)
    }
}

/// Encodes drafts for one device platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionEncoder {
    platform: Platform,
}

impl SubmissionEncoder {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Encode a draft. `now` stamps generated image file names.
    pub fn encode(
        &self,
        draft: &OperatorDraft,
        now: DateTime<Utc>,
    ) -> Result<MultipartPayload, EncodeError> {
        self.encode_fields(draft.fields()?, draft.editing_id().is_some(), now)
    }

    fn encode_fields(
        &self,
        fields: Vec<(&'static str, FieldValue)>,
        editing: bool,
        now: DateTime<Utc>,
    ) -> Result<MultipartPayload, EncodeError> {
        let mut payload = MultipartPayload::default();
        let stamp = now.timestamp_millis();

        for (field, value) in fields {
            let encoding = encoding_for(field).ok_or_else(|| EncodeError::UnhandledField {
                field: field.to_string(),
            })?;

            match (encoding, value) {
                (_, FieldValue::Absent) => {}
                (FieldEncoding::Text, FieldValue::Scalar(value)) => {
                    payload.parts.push(PayloadPart::Text {
                        name: field.to_string(),
                        value,
                    });
                }
                (FieldEncoding::EditOnly, FieldValue::Scalar(value)) => {
                    if editing {
                        payload.parts.push(PayloadPart::Text {
                            name: field.to_string(),
                            value,
                        });
                    }
                }
                (FieldEncoding::JsonList, FieldValue::List(list)) => {
                    let is_empty = list.as_array().is_some_and(|a| a.is_empty());
                    if !is_empty {
                        let value = serde_json::to_string(&list).map_err(|e| {
                            EncodeError::Serialization {
                                field: field.to_string(),
                                reason: e.to_string(),
                            }
                        })?;
                        payload.parts.push(PayloadPart::Text {
                            name: field.to_string(),
                            value,
                        });
                    }
                }
                (FieldEncoding::Image, FieldValue::Image(image)) => {
                    if image.is_remote() {
                        debug!(field, uri = %image.uri, "Skipping already uploaded image");
                        continue;
                    }
                    payload.parts.push(PayloadPart::File {
                        name: field.to_string(),
                        uri: self.platform.normalize_uri(&image.uri).to_string(),
                        file_name: format!("{field}_{stamp}.jpg"),
                        content_type: IMAGE_CONTENT_TYPE.to_string(),
                    });
                }
                (encoding, _) => {
                    return Err(EncodeError::KindMismatch {
                        field: field.to_string(),
                        expected: format!("{encoding:?}"),
                    });
                }
            }
        }

        debug!(parts = payload.parts.len(), editing, "Encoded operator payload");
        Ok(payload)
    }
}
