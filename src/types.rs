//! Wire types for the notification pipeline
//!
//! Everything here is constructed fresh per request and dropped once the
//! response is written; nothing is persisted.

use serde::{Deserialize, Serialize};

/// Validated inbound detection record
///
/// `attachments` has already been filtered to image mimetypes by the
/// validator; the original order is preserved.
#[derive(Debug, Clone)]
pub struct DetectionRecord {
    pub message: String,
    pub attachments: Vec<InboundAttachment>,
}

/// One inline attachment from the inbound request body
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InboundAttachment {
    /// Raw base64 payload, or a complete `data:` URI
    pub base64: String,
    /// Mime type as reported by the producer (e.g. `image/png`)
    pub mimetype: String,
}

/// Outcome of resolving the detection's audio recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingResolution {
    /// Recording fetched and inlined as an `audio/mpeg` data URI
    Attach { data: String, url: String },
    /// Reference URL only, no fetch performed
    Embed { url: String },
    /// No listen URL, unparseable URL, missing filename/date, or fetch failure
    Unavailable,
}

impl RecordingResolution {
    /// Archive URL of the recording, when one was derived
    pub fn url(&self) -> Option<&str> {
        match self {
            RecordingResolution::Attach { url, .. } | RecordingResolution::Embed { url } => {
                Some(url)
            }
            RecordingResolution::Unavailable => None,
        }
    }
}

/// Payload for the primary messaging gateway
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    /// Data URIs; omitted from the wire entirely when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    pub message: String,
    #[serde(rename = "recipientHandle")]
    pub recipient_handle: String,
    pub recipients: Vec<String>,
}

/// Payload for the secondary team-chat webhook (Slack Block Kit)
#[derive(Debug, Clone, Serialize)]
pub struct SecondaryPayload {
    pub blocks: Vec<SlackBlock>,
}

/// Slack Block Kit block
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlock {
    Image {
        image_url: String,
        alt_text: String,
    },
    Section {
        text: SlackText,
    },
    Actions {
        elements: Vec<SlackElement>,
    },
}

/// Slack text object
#[derive(Debug, Clone, Serialize)]
pub struct SlackText {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
}

impl SlackText {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn".to_string(),
            text: text.into(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text_type: "plain_text".to_string(),
            text: text.into(),
        }
    }
}

/// Slack interactive element (only buttons are used)
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackElement {
    Button { text: SlackText, url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_attachments_omitted_from_payload() {
        let payload = NotificationPayload {
            attachments: vec![],
            message: "hello".to_string(),
            recipient_handle: "+15550001111".to_string(),
            recipients: vec!["+15550002222".to_string()],
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("attachments").is_none());
        assert_eq!(value["recipientHandle"], "+15550001111");
    }

    #[test]
    fn test_nonempty_attachments_serialized() {
        let payload = NotificationPayload {
            attachments: vec!["data:image/png;base64,AAAA".to_string()],
            message: "hello".to_string(),
            recipient_handle: "+15550001111".to_string(),
            recipients: vec!["+15550002222".to_string()],
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["attachments"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_slack_block_tagging() {
        let block = SlackBlock::Section {
            text: SlackText::mrkdwn("A Blue Jay"),
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "section");
        assert_eq!(value["text"]["type"], "mrkdwn");
    }

    #[test]
    fn test_recording_resolution_url_accessor() {
        let embed = RecordingResolution::Embed {
            url: "http://host/By_Date/x".to_string(),
        };
        assert_eq!(embed.url(), Some("http://host/By_Date/x"));
        assert_eq!(RecordingResolution::Unavailable.url(), None);
    }
}
