//! data structures for deserializing incoming alerts
use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// alert group received by the alertmanager webhook receiver
///
/// Missing fields decode to their zero values, matching what alertmanager
/// actually sends across versions.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::missing_docs_in_private_items)]
pub struct Data {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub group_key: String,

    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub group_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub common_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub common_annotations: BTreeMap<String, String>,
    #[serde(default, rename = "externalURL")]
    pub external_url: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::missing_docs_in_private_items)]
pub struct Alert {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default = "unix_epoch")]
    pub starts_at: DateTime<Utc>,
    #[serde(default = "unix_epoch")]
    pub ends_at: DateTime<Utc>,
    #[serde(default, rename = "generatorURL")]
    pub generator_url: String,
}

/// serde default for absent timestamps
fn unix_epoch() -> DateTime<Utc> {
    Utc.timestamp(0, 0)
}

impl Alert {
    /// the `severity` label, uppercased; an absent label reads as the empty
    /// string
    pub fn severity(&self) -> String {
        self.labels
            .get("severity")
            .map(|s| s.to_uppercase())
            .unwrap_or_default()
    }

    /// the `summary` annotation; absent reads as the empty string
    pub fn summary(&self) -> &str {
        self.annotations
            .get("summary")
            .map(String::as_str)
            .unwrap_or("")
    }
}
