//! Inbound request validation
//!
//! Enforces the detection-record shape before anything downstream runs. The
//! rules are ordered: envelope shape first (400s), then the message grammar
//! the upstream producer promises (500s), then attachment hygiene. Attachments
//! are normalized to the image-only subset as a side effect of validation.

use serde_json::Value;

use crate::error::{ContentError, NotifyError, ShapeError};
use crate::types::{DetectionRecord, InboundAttachment};

/// Field separator used by the upstream detection message format
pub const FIELD_SEPARATOR: &str = " --- ";

/// Validate a decoded JSON body into a [`DetectionRecord`].
///
/// Attachments, when present, are filtered down to entries whose mimetype
/// starts with `image/`; non-image entries are dropped silently once their
/// fields check out.
pub fn validate_record(body: &Value) -> Result<DetectionRecord, NotifyError> {
    let obj = match body {
        Value::Object(map) => map,
        _ => return Err(ShapeError::NotAnObject.into()),
    };

    let message = match obj.get("message") {
        Some(Value::String(s)) => s.clone(),
        _ => return Err(ShapeError::MessageNotString.into()),
    };

    if !message.contains(FIELD_SEPARATOR) {
        return Err(ContentError::MissingSeparator.into());
    }

    if !message.contains("sciname=") {
        return Err(ContentError::MissingSciname.into());
    }

    let attachments = match obj.get("attachments") {
        None => Vec::new(),
        Some(Value::Array(entries)) => {
            let mut kept = Vec::new();
            for entry in entries {
                let base64 = match entry.get("base64") {
                    Some(Value::String(s)) => s.clone(),
                    _ => return Err(ContentError::AttachmentMissingBase64.into()),
                };
                let mimetype = match entry.get("mimetype") {
                    Some(Value::String(s)) => s.clone(),
                    _ => return Err(ContentError::AttachmentMissingMimetype.into()),
                };

                if mimetype.starts_with("image/") {
                    kept.push(InboundAttachment { base64, mimetype });
                }
            }
            kept
        }
        Some(_) => return Err(ContentError::AttachmentsNotArray.into()),
    };

    Ok(DetectionRecord {
        message,
        attachments,
    })
}
