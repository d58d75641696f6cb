//! Cold-start loading: remote channel → local storage → built-in defaults.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::error::AppError;
use crate::models::semester::REASON_VOID_DOWNLOAD;
use crate::models::{CURRENT_STORE_VERSION, Course, StoreDocument};
use crate::normalize::{parse_course_list, parse_store};
use crate::storage::{Storage, backup};
use crate::store::default_document;
use crate::void::{MIN_CHANNEL_KEY_LEN, VoidClient};

/// Flag cancelling an in-flight bootstrap. When set before the remote fetch
/// resolves, its result is discarded instead of overwriting newer state.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct BootstrapService {
    storage: Arc<dyn Storage>,
    void: Arc<dyn VoidClient>,
    storage_key: String,
    void_key_storage_key: String,
}

impl BootstrapService {
    pub fn new(
        storage: Arc<dyn Storage>,
        void: Arc<dyn VoidClient>,
        storage_key: impl Into<String>,
        void_key_storage_key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            void,
            storage_key: storage_key.into(),
            void_key_storage_key: void_key_storage_key.into(),
        }
    }

    /// Produces the initial document. Exactly one source wins: a valid local
    /// store short-circuits the remote fetch entirely; the remote channel is
    /// tried only when local parsing yielded nothing and a saved channel key
    /// exists. Every failure falls through silently to the next source, and
    /// the worst case is the built-in default dataset.
    pub async fn load_store(&self, default_data: &[Course], cancel: &CancelFlag) -> StoreDocument {
        let saved = self.storage.read(&self.storage_key);
        let local = saved.as_deref().and_then(|text| parse_store(text, default_data));

        if let (Some(text), None) = (saved.as_deref(), local.as_ref()) {
            // Keep the rejected payload around for forensic recovery.
            warn!("stored document rejected, backing it up before falling back");
            backup(self.storage.as_ref(), &self.storage_key, text, "parse_failed_backup");
        }

        let local_fallback = local.clone().unwrap_or_else(|| default_document(default_data));

        if local.is_none() {
            if let Some(document) = self.try_remote(&local_fallback, default_data).await {
                if cancel.is_cancelled() {
                    info!("bootstrap cancelled, discarding remote result");
                } else {
                    let text = serde_json::to_string(&document).unwrap_or_default();
                    self.storage.write(&self.storage_key, &text);
                    return document;
                }
            }
        }

        local_fallback
    }

    async fn try_remote(
        &self,
        local_fallback: &StoreDocument,
        default_data: &[Course],
    ) -> Option<StoreDocument> {
        let channel_key = self.storage.read(&self.void_key_storage_key)?;
        if channel_key.len() < MIN_CHANNEL_KEY_LEN {
            return None;
        }

        let text = match self.void.download(&channel_key).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                info!("void channel holds no data");
                return None;
            }
            Err(e) => {
                warn!("void download failed, falling back to local: {}", e);
                return None;
            }
        };

        if let Some(document) = parse_store(&text, default_data) {
            info!(
                "bootstrapped {} semesters from void channel",
                document.semesters.len()
            );
            return Some(document);
        }

        // Legacy channels hold a bare course array; merge it into the
        // fallback's active semester as a download-overwrite.
        let Some(courses) = parse_course_list(&text) else {
            warn!("void payload is neither a store nor a course list, ignoring");
            return None;
        };

        let active_id = local_fallback.active_semester_id.clone();
        let semesters = local_fallback
            .semesters
            .iter()
            .map(|s| {
                if s.id == active_id {
                    s.with_courses(REASON_VOID_DOWNLOAD, courses.clone())
                } else {
                    s.clone()
                }
            })
            .collect();

        Some(StoreDocument {
            version: CURRENT_STORE_VERSION,
            active_semester_id: active_id,
            semesters,
        })
    }

    /// Explicit user-initiated upload of a serialized store to a channel.
    /// On success the channel key is remembered for the next bootstrap.
    pub async fn upload_store(&self, channel_key: &str, payload: &str) -> Result<(), AppError> {
        if channel_key.len() < MIN_CHANNEL_KEY_LEN {
            return Err(AppError::InvalidPayload(
                "channel key must be at least 3 characters".to_string(),
            ));
        }
        self.void.upload(channel_key, payload).await?;
        self.storage.write(&self.void_key_storage_key, channel_key);
        Ok(())
    }
}
