//! Decoding of Alertmanager webhook bodies.
//!
//! Only the group-level fields are used:
//!
//! ```json
//! {
//!   "status": "firing",
//!   "commonAnnotations": { "message": "...", "description": "..." },
//!   "commonLabels": { "deployment": "...", "environment": "..." }
//! }
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::PayloadError;
use crate::types::{Alert, AlertStatus};

/// Builds an [`Alert`] from a decoded webhook body.
///
/// The title is `commonAnnotations.message`, falling back to
/// `commonAnnotations.summary`. A missing description becomes an empty
/// string and missing labels an empty map. Non-string label values are
/// skipped.
///
/// # Errors
///
/// Returns a [`PayloadError`] when the status, the annotations object or a
/// title is missing, or when the status is not `firing`/`resolved`.
pub fn parse_alert(payload: &Value) -> Result<Alert, PayloadError> {
    let status = payload
        .get("status")
        .and_then(Value::as_str)
        .ok_or(PayloadError::MissingStatus)?;
    let status =
        AlertStatus::parse(status).ok_or_else(|| PayloadError::UnknownStatus(status.to_string()))?;

    let annotations = payload
        .get("commonAnnotations")
        .filter(|v| v.is_object())
        .ok_or(PayloadError::MissingAnnotations)?;

    let title = annotations
        .get("message")
        .or_else(|| annotations.get("summary"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(PayloadError::MissingTitle)?
        .to_string();

    let description = annotations
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let labels = payload
        .get("commonLabels")
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    Ok(Alert {
        status,
        title,
        description,
        labels,
    })
}
