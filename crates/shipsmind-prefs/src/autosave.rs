//! Debounced saving of preference edits.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shipsmind_retry::AuthError;
use shipsmind_timing::Debouncer;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{Preferences, PreferencesApi, PreferencesService, PreferencesUpdate};

/// Coalesces rapid edits into one save per quiet period.
///
/// Each [`edit`](Self::edit) folds its fields into a pending update (later
/// values win) and restarts the quiet period. Only when no edit has
/// arrived for the whole delay is the merged update saved.
///
/// ```text
/// edits:  theme  notif  theme
///           │      │      │
///           └──────┴──────┴── 1 s quiet ──→ one PATCH {theme, notif}
/// ```
#[derive(Debug)]
pub struct AutoSave<A> {
    service: Arc<PreferencesService<A>>,
    user_id: String,
    debouncer: Debouncer,
    pending: Arc<Mutex<PreferencesUpdate>>,
}

impl<A: PreferencesApi> AutoSave<A> {
    pub fn new(service: Arc<PreferencesService<A>>, user_id: impl Into<String>) -> Self {
        Self::with_debouncer(service, user_id, Debouncer::default())
    }

    pub fn with_debouncer(
        service: Arc<PreferencesService<A>>,
        user_id: impl Into<String>,
        debouncer: Debouncer,
    ) -> Self {
        Self {
            service,
            user_id: user_id.into(),
            debouncer,
            pending: Arc::new(Mutex::new(PreferencesUpdate::default())),
        }
    }

    /// Queues an edit. The returned handle resolves to `true` if this
    /// edit's timer was the one that saved.
    ///
    /// Save failures are logged; the edit stays lost until the user edits
    /// again. Use [`flush`](Self::flush) to save and see the error.
    pub fn edit(&self, update: PreferencesUpdate) -> JoinHandle<bool> {
        lock(&self.pending).merge(update);

        let service = Arc::clone(&self.service);
        let pending = Arc::clone(&self.pending);
        let user_id = self.user_id.clone();
        self.debouncer.call(async move {
            let update = std::mem::take(&mut *lock(&pending));
            if update.is_empty() {
                return;
            }
            match service.update(&user_id, update).await {
                Ok(_) => debug!(%user_id, "auto-saved preferences"),
                Err(e) => warn!(%user_id, error = %e, "auto-save failed"),
            }
        })
    }

    /// Saves whatever is pending right now, skipping the quiet period.
    /// `Ok(None)` if there was nothing to save.
    pub async fn flush(&self) -> Result<Option<Preferences>, AuthError> {
        self.debouncer.cancel();
        let update = std::mem::take(&mut *lock(&self.pending));
        if update.is_empty() {
            return Ok(None);
        }
        self.service.update(&self.user_id, update).await.map(Some)
    }

    /// Drops pending edits without saving.
    pub fn discard(&self) {
        self.debouncer.cancel();
        *lock(&self.pending) = PreferencesUpdate::default();
    }

    /// Whether an edit is waiting to be saved.
    pub fn has_pending(&self) -> bool {
        !lock(&self.pending).is_empty()
    }
}

fn lock(pending: &Mutex<PreferencesUpdate>) -> MutexGuard<'_, PreferencesUpdate> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
