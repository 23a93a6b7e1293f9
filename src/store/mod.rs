//! Profile store
//!
//! A single JSON object-store file: profile blobs under `profile:<id>` keys
//! and one `activeProfileId` metadata key. Profiles are opaque JSON objects;
//! nothing here validates their shape. Writes rewrite the whole file, and
//! concurrent writers can race (accepted).

use crate::error::{FormfillError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const PROFILE_PREFIX: &str = "profile:";
const ACTIVE_KEY: &str = "activeProfileId";

/// One remembered form submission for a site, stored in the profile's
/// `sites` array. Matched by domain equality only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    pub domain: String,
    pub url: String,
    pub fields: IndexMap<String, String>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_count: Option<u32>,
}

/// File-backed key-value store for profiles.
pub struct ProfileStore {
    path: PathBuf,
    data: serde_json::Map<String, Value>,
}

impl ProfileStore {
    /// Open the store at `path`, creating an empty one in memory if the file
    /// does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str(&raw)? {
                Value::Object(map) => map,
                other => {
                    return Err(FormfillError::Store(format!(
                        "store file must hold a JSON object, found {other}"
                    )))
                }
            }
        } else {
            serde_json::Map::new()
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&Value::Object(self.data.clone()))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Profile ids present in the store, in insertion order.
    pub fn list_profiles(&self) -> Vec<String> {
        self.data
            .keys()
            .filter_map(|k| k.strip_prefix(PROFILE_PREFIX))
            .map(String::from)
            .collect()
    }

    pub fn get_profile(&self, id: &str) -> Result<Value> {
        self.data
            .get(&format!("{PROFILE_PREFIX}{id}"))
            .cloned()
            .ok_or_else(|| FormfillError::ProfileNotFound(id.to_string()))
    }

    pub fn save_profile(&mut self, id: &str, profile: Value) -> Result<()> {
        self.data.insert(format!("{PROFILE_PREFIX}{id}"), profile);
        self.persist()
    }

    /// Remove a profile. Clears the active id when it pointed at the removed
    /// profile.
    pub fn delete_profile(&mut self, id: &str) -> Result<()> {
        if self.data.remove(&format!("{PROFILE_PREFIX}{id}")).is_none() {
            return Err(FormfillError::ProfileNotFound(id.to_string()));
        }
        if self.active_profile_id().as_deref() == Some(id) {
            self.data.remove(ACTIVE_KEY);
        }
        self.persist()
    }

    pub fn active_profile_id(&self) -> Option<String> {
        self.data
            .get(ACTIVE_KEY)
            .and_then(Value::as_str)
            .map(String::from)
    }

    pub fn set_active_profile(&mut self, id: &str) -> Result<()> {
        if !self.data.contains_key(&format!("{PROFILE_PREFIX}{id}")) {
            return Err(FormfillError::ProfileNotFound(id.to_string()));
        }
        self.data
            .insert(ACTIVE_KEY.to_string(), Value::String(id.to_string()));
        self.persist()
    }

    /// The active profile's blob.
    pub fn active_profile(&self) -> Result<Value> {
        let id = self
            .active_profile_id()
            .ok_or(FormfillError::NoActiveProfile)?;
        self.get_profile(&id)
    }

    /// Merge a site record into the profile's `sites` array, matched by
    /// domain. An existing record gets the new fields merged in and its
    /// `lastUsed`/`useCount` bumped; otherwise the record is appended with
    /// `useCount` 1.
    pub fn record_site_use(&mut self, id: &str, record: SiteRecord) -> Result<()> {
        let mut profile = self.get_profile(id)?;
        upsert_site(&mut profile, record)?;
        self.save_profile(id, profile)
    }
}

/// Site records currently stored for a domain in the given profile blob.
pub fn site_for_domain(profile: &Value, domain: &str) -> Option<SiteRecord> {
    profile
        .get("sites")?
        .as_array()?
        .iter()
        .find(|s| s.get("domain").and_then(Value::as_str) == Some(domain))
        .and_then(|s| serde_json::from_value(s.clone()).ok())
}

fn upsert_site(profile: &mut Value, record: SiteRecord) -> Result<()> {
    if !profile.is_object() {
        return Err(FormfillError::Store(
            "profile must be a JSON object".to_string(),
        ));
    }
    let sites = profile
        .as_object_mut()
        .and_then(|o| {
            o.entry("sites")
                .or_insert_with(|| Value::Array(Vec::new()))
                .as_array_mut()
        })
        .ok_or_else(|| FormfillError::Store("profile sites must be an array".to_string()))?;

    let existing = sites
        .iter_mut()
        .find(|s| s.get("domain").and_then(Value::as_str) == Some(record.domain.as_str()));

    match existing {
        Some(site) => {
            // The record keeps its first-seen url and timestamp; a repeat
            // submission only refreshes fields, lastUsed, and useCount.
            let mut merged: SiteRecord = serde_json::from_value(site.clone())
                .map_err(|e| FormfillError::Store(format!("corrupt site record: {e}")))?;
            merged.last_used = Some(record.timestamp);
            merged.use_count = Some(merged.use_count.unwrap_or(1) + 1);
            for (k, v) in record.fields {
                merged.fields.insert(k, v);
            }
            *site = serde_json::to_value(merged)?;
        }
        None => {
            let mut fresh = record;
            fresh.last_used = Some(fresh.timestamp.clone());
            fresh.use_count = Some(1);
            sites.push(serde_json::to_value(fresh)?);
        }
    }
    Ok(())
}
