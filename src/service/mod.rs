//! Service layer
//!
//! Tagged request messages with JSON payloads, dispatched against the chat
//! gateway and the profile store. Handler failures never surface as `Err`:
//! every error is rendered into the response payload as `{"error": message}`
//! so the transport only ever carries a JSON value either way.

use crate::dom::PageSnapshot;
use crate::error::{FormfillError, Result};
use crate::fill::fill_form;
use crate::llm::{prompts, ChatClient};
use crate::scan::{scan_fields, FieldDescriptor};
use crate::store::{site_for_domain, ProfileStore, SiteRecord};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Page context sent to the autofill prompt: what the scanner saw, plus
/// where it saw it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    pub url: String,
    pub title: String,
    pub fields: Vec<FieldDescriptor>,
}

/// A tracked form submission, as captured at submit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmission {
    pub url: String,
    pub domain: String,
    pub fields: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_class: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

/// The message protocol. `type` tags mirror the wire names.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "extract_profile")]
    ExtractProfile { text: String },
    #[serde(rename = "autofill")]
    Autofill {
        context: PageContext,
        profile: Value,
        #[serde(default)]
        instructions: Option<String>,
    },
    #[serde(rename = "start_fill")]
    StartFill {
        page: PageSnapshot,
        #[serde(default)]
        profile: Option<Value>,
        #[serde(default)]
        instructions: Option<String>,
    },
    #[serde(rename = "form/analyze")]
    FormAnalyze { payload: FormSubmission },
    #[serde(rename = "form/save")]
    FormSave { payload: FormSubmission },
}

/// Request dispatcher over a chat client and a profile store.
pub struct Service {
    client: ChatClient,
    store: ProfileStore,
}

impl Service {
    pub fn new(client: ChatClient, store: ProfileStore) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProfileStore {
        &mut self.store
    }

    /// Dispatch a request. Always returns a payload; failures become
    /// `{"error": message}`.
    pub async fn handle(&mut self, request: Request) -> Value {
        let result = match request {
            Request::ExtractProfile { text } => self.extract_profile(&text).await,
            Request::Autofill {
                context,
                profile,
                instructions,
            } => {
                self.autofill(&context, &profile, instructions.as_deref())
                    .await
            }
            Request::StartFill {
                page,
                profile,
                instructions,
            } => self.start_fill(page, profile, instructions.as_deref()).await,
            Request::FormAnalyze { payload } => self.form_analyze(&payload),
            Request::FormSave { payload } => self.form_save(payload),
        };
        match result {
            Ok(value) => value,
            Err(e) => {
                log::error!("request failed: {e}");
                json!({ "error": e.to_string() })
            }
        }
    }

    async fn extract_profile(&self, text: &str) -> Result<Value> {
        self.client
            .chat(&prompts::extract_profile_prompt(), text)
            .await
    }

    async fn autofill(
        &self,
        context: &PageContext,
        profile: &Value,
        instructions: Option<&str>,
    ) -> Result<Value> {
        let selectors: Vec<String> = context.fields.iter().map(|f| f.selector.clone()).collect();
        let system = prompts::autofill_prompt(&selectors);

        let mut payload = json!({
            "PAGE_CONTEXT": context,
            "USER_PROFILE": profile,
        });
        if let Some(instructions) = instructions {
            payload["INSTRUCTIONS"] = Value::String(instructions.to_string());
        }
        let user_content = serde_json::to_string_pretty(&payload)?;

        self.client.chat(&system, &user_content).await
    }

    /// The full cycle: scan, ask the model, apply. Independent per request.
    async fn start_fill(
        &mut self,
        mut page: PageSnapshot,
        profile: Option<Value>,
        instructions: Option<&str>,
    ) -> Result<Value> {
        let fields = scan_fields(&page);
        let fields_found = fields.len();
        log::info!("scanned {} fillable fields on {}", fields_found, page.url);

        if fields.is_empty() {
            return Ok(json!({
                "success": true,
                "fieldsFound": 0,
                "fieldsFilled": 0,
            }));
        }

        let profile = match profile {
            Some(p) => p,
            None => self.store.active_profile()?,
        };

        let context = PageContext {
            url: page.url.clone(),
            title: page.title.clone(),
            fields,
        };
        let response = self.autofill(&context, &profile, instructions).await?;
        let values = fill_values(&response);
        let report = fill_form(&mut page, &values);

        Ok(json!({
            "success": true,
            "fieldsFound": fields_found,
            "fieldsFilled": report.fields_filled(),
        }))
    }

    /// Diff a submission against the active profile's record for the domain.
    fn form_analyze(&self, payload: &FormSubmission) -> Result<Value> {
        let Some(id) = self.store.active_profile_id() else {
            return Ok(json!({
                "shouldPromptSave": false,
                "message": "no active profile",
            }));
        };
        let domain = submission_domain(payload)?;
        let profile = self.store.get_profile(&id)?;
        let existing = site_for_domain(&profile, &domain);
        let (new_fields, conflict_fields) = diff_fields(
            existing.as_ref().map(|s| &s.fields),
            &payload.fields,
        );
        let should_save = !new_fields.is_empty() || !conflict_fields.is_empty();

        Ok(json!({
            "shouldSave": should_save,
            "shouldPromptSave": should_save,
            "newFields": new_fields,
            "conflictFields": conflict_fields,
            "data": payload,
        }))
    }

    /// Merge a submission into the active profile's site record.
    fn form_save(&mut self, payload: FormSubmission) -> Result<Value> {
        let id = self
            .store
            .active_profile_id()
            .ok_or(FormfillError::NoActiveProfile)?;

        let domain = submission_domain(&payload)?;
        let timestamp = if payload.timestamp.is_empty() {
            chrono::Utc::now().to_rfc3339()
        } else {
            payload.timestamp
        };
        let record = SiteRecord {
            domain,
            url: payload.url,
            fields: payload.fields,
            timestamp,
            last_used: None,
            use_count: None,
        };
        self.store.record_site_use(&id, record)?;

        Ok(json!({ "success": true, "profileId": id }))
    }
}

/// Coerce the model's selector→value object into the ordered map the fill
/// applier takes. Scalar values stringify; nested structures are dropped.
pub fn fill_values(response: &Value) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let Some(object) = response.as_object() else {
        return out;
    };
    for (selector, value) in object {
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        out.insert(selector.clone(), value);
    }
    out
}

/// Domain a submission is matched under: the explicit field when present,
/// else the host of its URL.
fn submission_domain(payload: &FormSubmission) -> Result<String> {
    if !payload.domain.is_empty() {
        return Ok(payload.domain.clone());
    }
    url::Url::parse(&payload.url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .ok_or_else(|| {
            FormfillError::Store(format!("submission has no domain: {}", payload.url))
        })
}

/// Split submitted fields into additions and conflicts relative to what is
/// already recorded. With no existing record, everything is new.
fn diff_fields(
    existing: Option<&IndexMap<String, String>>,
    submitted: &IndexMap<String, String>,
) -> (IndexMap<String, String>, IndexMap<String, Value>) {
    let mut new_fields = IndexMap::new();
    let mut conflicts = IndexMap::new();
    for (key, value) in submitted {
        match existing.and_then(|e| e.get(key)) {
            None => {
                new_fields.insert(key.clone(), value.clone());
            }
            Some(old) if old != value => {
                conflicts.insert(key.clone(), json!({ "old": old, "new": value }));
            }
            Some(_) => {}
        }
    }
    (new_fields, conflicts)
}
