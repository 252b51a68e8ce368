use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use civic_core_types::{Draft, Report, Settings, User};

use crate::errors::{StoreError, StoreResult};

/// Full durable state of the repository.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub reports: Vec<Report>,
    pub drafts: Vec<Draft>,
    pub current_user: Option<User>,
    pub settings: Settings,
}

/// On-disk shape before each entry is checked.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredSnapshot {
    reports: Vec<Value>,
    drafts: Vec<Value>,
    current_user: Option<Value>,
    settings: Option<Value>,
}

impl Snapshot {
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|err| StoreError::Encode(err.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> StoreResult<Self> {
        Self::decode_lenient(bytes).map(|(snapshot, _)| snapshot)
    }

    /// Decodes entry by entry. Reports and drafts that do not parse are
    /// dropped with a warning; an unparseable user or settings block falls
    /// back to its default. Only a document that is not a snapshot object at
    /// all is an error. Returns the snapshot and the number of dropped entries.
    pub fn decode_lenient(bytes: &[u8]) -> StoreResult<(Self, usize)> {
        let stored: StoredSnapshot =
            serde_json::from_slice(bytes).map_err(|err| StoreError::Corrupt(err.to_string()))?;
        let mut dropped = 0;
        let reports = decode_entries(stored.reports, "report", &mut dropped);
        let drafts = decode_entries(stored.drafts, "draft", &mut dropped);
        let current_user = stored
            .current_user
            .and_then(|value| decode_part(value, "currentUser"));
        let settings = stored
            .settings
            .and_then(|value| decode_part(value, "settings"))
            .unwrap_or_default();
        Ok((
            Self {
                reports,
                drafts,
                current_user,
                settings,
            },
            dropped,
        ))
    }

    /// Drops reports whose timeline breaks the state machine and repeated
    /// ids, keeping the first occurrence. Returns how many were dropped.
    pub fn discard_invalid(&mut self) -> usize {
        let before = self.reports.len();
        let mut seen = HashSet::new();
        self.reports.retain(|report| {
            if let Err(err) = report.validate() {
                warn!(report_id = %report.id, error = %err, "dropping report with invalid timeline");
                return false;
            }
            if !seen.insert(report.id.clone()) {
                warn!(report_id = %report.id, "dropping duplicate report id");
                return false;
            }
            true
        });
        before - self.reports.len()
    }
}

fn decode_entries<T: DeserializeOwned>(
    values: Vec<Value>,
    kind: &'static str,
    dropped: &mut usize,
) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(kind, index, error = %err, "dropping malformed snapshot entry");
                *dropped += 1;
                None
            }
        })
        .collect()
}

fn decode_part<T: DeserializeOwned>(value: Value, key: &'static str) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(part) => Some(part),
        Err(err) => {
            warn!(key, error = %err, "ignoring malformed snapshot field");
            None
        }
    }
}
