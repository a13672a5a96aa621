//! Dedup keys: the value used both as ticket title and as search query.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Alert;

/// Separator placed between label values in a label-based key.
pub const LABEL_KEY_SEPARATOR: &str = " / ";

/// How the dedup key of an alert is derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "labels")]
pub enum DedupStrategy {
    /// Use the alert title.
    #[default]
    Title,
    /// Join the values of these labels, in this order.
    Labels(Vec<String>),
}

impl DedupStrategy {
    /// Builds a strategy from a list of label names; an empty list means [`Self::Title`].
    #[must_use]
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(Into::into)
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if labels.is_empty() {
            Self::Title
        } else {
            Self::Labels(labels)
        }
    }

    /// Computes the dedup key for `alert`.
    ///
    /// A label strategy falls back to the title when any configured label is
    /// missing or empty.
    #[must_use]
    pub fn key_for(&self, alert: &Alert) -> String {
        match self {
            Self::Title => alert.title.clone(),
            Self::Labels(names) => {
                let values: Option<Vec<&str>> = names
                    .iter()
                    .map(|name| {
                        alert
                            .labels
                            .get(name)
                            .map(String::as_str)
                            .filter(|v| !v.is_empty())
                    })
                    .collect();

                match values {
                    Some(values) => values.join(LABEL_KEY_SEPARATOR),
                    None => {
                        warn!(
                            labels = ?names,
                            title = %alert.title,
                            "alert lacks dedup labels, falling back to title"
                        );
                        alert.title.clone()
                    }
                }
            }
        }
    }
}
