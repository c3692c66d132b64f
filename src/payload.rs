//! Channel payload construction
//!
//! Builds the human-readable notification text and the gateway/webhook JSON
//! payloads from a parsed field map and the recording resolution outcome.

use std::collections::HashMap;

use crate::config::Config;
use crate::types::{
    DetectionRecord, InboundAttachment, NotificationPayload, RecordingResolution,
    SecondaryPayload, SlackBlock, SlackElement, SlackText,
};

/// Fallback for fields the producer left out of the message
const UNKNOWN: &str = "unknown";

/// Grammatical article for a common name.
///
/// Only the literal letter `a`/`A` selects "An"; this is not true vowel
/// detection.
/// This mirrors the upstream producer's rule for bird common names; keep it
/// narrow.
fn article(comname: &str) -> &'static str {
    if comname
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'a'))
    {
        "An"
    } else {
        "A"
    }
}

/// Confidence display value: `confidencepct` verbatim when present, else
/// `confidence` parsed as a fraction and formatted to two decimal places.
fn confidence(fields: &HashMap<String, String>) -> String {
    if let Some(pct) = fields.get("confidencepct") {
        return pct.clone();
    }

    fields
        .get("confidence")
        .and_then(|raw| raw.parse::<f64>().ok())
        .map(|fraction| format!("{:.2}", fraction))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Format the notification text.
///
/// `listen_url` appends a `Listen:` line; a `flickrimage` field appends its
/// value as a trailing paragraph. The secondary channel reuses this without
/// the listen line (it carries the URL as a button instead).
pub fn format_message(fields: &HashMap<String, String>, listen_url: Option<&str>) -> String {
    let comname = fields.get("comname").map(String::as_str).unwrap_or(UNKNOWN);
    let sciname = fields.get("sciname").map(String::as_str).unwrap_or(UNKNOWN);

    let mut message = format!(
        "{} {} ({}) was just detected with a confidence of {}%",
        article(comname),
        comname,
        sciname,
        confidence(fields)
    );

    if let Some(url) = listen_url {
        message.push_str("\n\nListen: ");
        message.push_str(url);
    }

    if let Some(flickr) = fields.get("flickrimage").filter(|f| !f.is_empty()) {
        message.push_str("\n\n");
        message.push_str(flickr);
    }

    message
}

/// Convert an inline attachment to a data URI, passing through payloads that
/// already are one.
fn to_data_uri(attachment: &InboundAttachment) -> String {
    if attachment.base64.starts_with("data:") {
        attachment.base64.clone()
    } else {
        format!("data:{};base64,{}", attachment.mimetype, attachment.base64)
    }
}

/// Build the primary gateway payload.
///
/// Attachment order: the first inbound image (if any), then the fetched
/// recording (if attach mode resolved one). The recording URL is embedded in
/// the text only for the `Embed` resolution; `Attach` carries it as data.
pub fn build_primary_payload(
    record: &DetectionRecord,
    fields: &HashMap<String, String>,
    recording: &RecordingResolution,
    config: &Config,
) -> NotificationPayload {
    let mut attachments = Vec::new();

    if let Some(image) = record.attachments.first() {
        attachments.push(to_data_uri(image));
    }

    let listen_url = match recording {
        RecordingResolution::Embed { url } => Some(url.as_str()),
        RecordingResolution::Attach { data, .. } => {
            attachments.push(data.clone());
            None
        }
        RecordingResolution::Unavailable => None,
    };

    NotificationPayload {
        attachments,
        message: format_message(fields, listen_url),
        recipient_handle: config.from_number.clone(),
        recipients: config.recipients.clone(),
    }
}

/// Build the secondary webhook payload.
///
/// `listen_url` is the archive reference computed independently of the
/// primary resolution, so the button appears even when the primary flow
/// attached (or failed to fetch) the recording.
pub fn build_secondary_payload(
    fields: &HashMap<String, String>,
    listen_url: Option<&str>,
    image_url: Option<&str>,
) -> SecondaryPayload {
    let comname = fields.get("comname").map(String::as_str).unwrap_or(UNKNOWN);

    let mut blocks = Vec::new();

    if let Some(url) = image_url {
        blocks.push(SlackBlock::Image {
            image_url: url.to_string(),
            alt_text: comname.to_string(),
        });
    }

    blocks.push(SlackBlock::Section {
        text: SlackText::mrkdwn(format_message(fields, None)),
    });

    if let Some(url) = listen_url {
        blocks.push(SlackBlock::Actions {
            elements: vec![SlackElement::Button {
                text: SlackText::plain("Listen"),
                url: url.to_string(),
            }],
        });
    }

    SecondaryPayload { blocks }
}
