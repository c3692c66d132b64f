//! Notification endpoint and dispatch sequencing
//!
//! POST / drives the pipeline: validate → parse → resolve recording → build
//! payload → primary send, with the secondary webhook dispatched on a
//! detached task that the response path never waits for. In return-early
//! mode the 201 goes out right after validation; resolution, payload build,
//! and the primary send all happen on a detached task and a send failure is
//! only logged.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::error::NotifyError;
use crate::parser::parse_fields;
use crate::payload::{build_primary_payload, build_secondary_payload};
use crate::services::recording_reference;
use crate::types::{DetectionRecord, NotificationPayload, RecordingResolution};
use crate::validator::validate_record;
use crate::AppState;

/// GET / (the endpoint only accepts POST)
pub async fn usage_hint() -> &'static str {
    "Please use POST"
}

/// POST / (receive a detection record and fan it out)
pub async fn notify(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let record = match validate_record(&body) {
        Ok(record) => record,
        Err(err) => {
            match &err {
                NotifyError::Shape(shape) => {
                    tracing::warn!(error = %shape, "Validation error");
                }
                other => {
                    tracing::error!(error = %other, "Malformed detection message");
                }
            }
            return err.into_response();
        }
    };

    let fields = parse_fields(&record.message);

    if state.config.return_early {
        // The caller is acknowledged before the recording fetch or the send
        // outcome is known; failures from here on are only logged.
        tokio::spawn(async move {
            let payload = resolve_and_build(&state, &record, &fields).await;
            if let Err(err) = state.signal.send(&payload).await {
                tracing::warn!(error = %err, "Primary send failed after early response");
            }
        });
        return (StatusCode::CREATED, Json(json!({ "success": null }))).into_response();
    }

    let payload = resolve_and_build(&state, &record, &fields).await;

    match state.signal.send(&payload).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Primary send failed");
            NotifyError::PrimarySend(err.detail()).into_response()
        }
    }
}

/// Resolve the recording, build the primary payload, and kick off the
/// secondary dispatch.
///
/// The recording resolution completes before the payload is built; its
/// failures degrade to `Unavailable` and never reach the caller.
async fn resolve_and_build(
    state: &AppState,
    record: &DetectionRecord,
    fields: &HashMap<String, String>,
) -> NotificationPayload {
    let listen_url = fields.get("listenurl").map(String::as_str);
    let date = fields.get("date").map(String::as_str);

    let recording = state
        .resolver
        .resolve(listen_url, date, state.config.attach_recording)
        .await;

    let payload = build_primary_payload(record, fields, &recording, &state.config);

    spawn_secondary_dispatch(state, fields, &recording);

    payload
}

/// Dispatch the secondary webhook on a detached task.
///
/// The Listen link is recomputed from the fields when the primary resolution
/// carries no URL, so the button survives attach-mode fetch failures. Missing
/// webhook configuration skips dispatch entirely.
fn spawn_secondary_dispatch(
    state: &AppState,
    fields: &HashMap<String, String>,
    recording: &RecordingResolution,
) {
    let Some(slack) = state.slack.clone() else {
        tracing::debug!("Secondary channel not configured; skipping dispatch");
        return;
    };

    let listen_url = recording.url().map(str::to_owned).or_else(|| {
        recording_reference(
            fields.get("listenurl").map(String::as_str),
            fields.get("date").map(String::as_str),
        )
    });

    let fields = fields.clone();
    let unsplash = state.unsplash.clone();

    tokio::spawn(async move {
        let image_url = match (&unsplash, fields.get("comname")) {
            (Some(client), Some(comname)) if !comname.is_empty() => {
                match client.first_photo_url(comname).await {
                    Ok(url) => url,
                    Err(err) => {
                        tracing::warn!(error = %err, "Image lookup failed");
                        None
                    }
                }
            }
            _ => None,
        };

        let payload = build_secondary_payload(&fields, listen_url.as_deref(), image_url.as_deref());

        if let Err(err) = slack.post(&payload).await {
            tracing::warn!(error = %err, "Secondary dispatch failed");
        }
    });
}
