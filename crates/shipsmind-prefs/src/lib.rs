//! User preferences for Shipsmind.
//!
//! ```text
//! AutoSave (debounced edits)
//!     ↓
//! PreferencesService  ← cache-first reads, retried writes, timing
//!     ↓
//! PreferencesClient   ← typed GET / PATCH / POST, envelope decoding
//!     ↓
//! PreferencesApi (host transport)
//! ```
//!
//! Stored records carry four fields: `theme` (`light`, `dark`,
//! `system`), `notifications`, `lastLoginReminder`, and
//! `verificationPrompted`.

mod api;
mod autosave;
mod client;
mod codec;
mod service;
mod types;

pub use api::{Method, PreferencesApi, RawResponse};
pub use autosave::AutoSave;
pub use client::PreferencesClient;
pub use codec::{decode_response, encode_body};
pub use service::{LOAD_CONTEXT, PreferencesService, UPDATE_CONTEXT, cache_key};
pub use types::{Preferences, PreferencesUpdate, Theme};
