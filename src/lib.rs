//! # formfill
//!
//! A form-autofill engine: scan a captured page snapshot for fillable fields,
//! ask an LLM to map a stored user profile onto them, and apply the returned
//! values back onto the snapshot.
//!
//! ## The autofill cycle
//!
//! ```rust,no_run
//! use formfill::{ChatClient, LlmConfig, PageSnapshot, ProfileStore, Request, Service};
//!
//! # async fn run() -> formfill::Result<()> {
//! let client = ChatClient::new(LlmConfig::from_env()?)?;
//! let store = ProfileStore::open("profiles.json")?;
//! let mut service = Service::new(client, store);
//!
//! let page = PageSnapshot::from_json(&std::fs::read_to_string("page.json")?)?;
//! let response = service
//!     .handle(Request::StartFill { page, profile: None, instructions: None })
//!     .await;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`dom`]: page snapshot model, element tree, and selector resolution
//! - [`scan`]: fillable-field discovery and field descriptions for the model
//! - [`fill`]: applying selector→value maps onto a snapshot
//! - [`llm`]: chat gateway with retries and fallback models, plus prompts
//! - [`store`]: file-backed profile store and per-site form records
//! - [`service`]: the tagged message protocol tying it all together
//! - [`error`]: error types and result alias

pub mod dom;
pub mod error;
pub mod fill;
pub mod llm;
pub mod scan;
pub mod service;
pub mod store;

pub use dom::{ElementNode, PageSnapshot};
pub use error::{FormfillError, Result};
pub use fill::{fill_form, FillReport};
pub use llm::{ChatClient, LlmConfig};
pub use scan::{scan_fields, FieldDescriptor};
pub use service::{Request, Service};
pub use store::{ProfileStore, SiteRecord};
