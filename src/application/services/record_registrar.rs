//! Create-side hook: persist, warm locally, announce.

use std::sync::Arc;
use tracing::{info, warn};

use crate::application::services::redirect_resolver::RedirectResolver;
use crate::domain::entities::RedirectRecord;
use crate::domain::record_created::RecordCreated;
use crate::domain::repositories::{RedirectStore, StoreError};
use crate::infrastructure::coherence::CoherencePublisher;

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Registers newly created records with the cache tiers.
///
/// # Flow
///
/// 1. Insert into the store (the only step that can fail the call)
/// 2. Warm L2 then L1 on this instance
/// 3. Publish a [`RecordCreated`] so other instances warm their L1
///
/// Without a publisher (single-instance mode) step 3 is skipped.
pub struct RecordRegistrar {
    store: Arc<dyn RedirectStore>,
    resolver: Arc<RedirectResolver>,
    publisher: Option<Arc<dyn CoherencePublisher>>,
}

impl RecordRegistrar {
    pub fn new(
        store: Arc<dyn RedirectStore>,
        resolver: Arc<RedirectResolver>,
        publisher: Option<Arc<dyn CoherencePublisher>>,
    ) -> Self {
        Self {
            store,
            resolver,
            publisher,
        }
    }

    /// Stores `record` and propagates it to the cache tiers.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::Store`] if the insert fails; nothing is
    /// cached or published in that case.
    pub async fn register(&self, record: RedirectRecord) -> Result<RecordCreated, RegisterError> {
        self.store.insert(&record).await?;

        let event = RecordCreated::for_record(&record);
        self.resolver.warm(record).await;

        if let Some(publisher) = &self.publisher {
            match publisher.publish(&event).await {
                Ok(receivers) => {
                    info!(short_code = %event.short_code, receivers, "record announced");
                }
                Err(e) => {
                    warn!(
                        short_code = %event.short_code,
                        error = %e,
                        "failed to publish coherence event"
                    );
                }
            }
        }

        Ok(event)
    }
}
