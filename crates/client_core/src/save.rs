use std::sync::atomic::{AtomicBool, Ordering};

use shared::{protocol::WorksheetRecord, worksheet::WorksheetContent};
use tracing::{info, warn};

use crate::{adapter::PersistenceAdapter, error::ClientError, session::Session};

/// The "Saving..." flag behind a worksheet's save button. At most one save runs at a time.
#[derive(Debug, Default)]
pub struct SaveGuard {
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SaveGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validates locally, then saves. A failed save leaves the guard ready for a manual retry.
    pub async fn save(
        &self,
        adapter: &dyn PersistenceAdapter,
        session: &Session,
        content: &WorksheetContent,
    ) -> Result<WorksheetRecord, ClientError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ClientError::SaveInFlight);
        }
        let _reset = InFlight(&self.in_flight);

        content.validate()?;
        let category = content.category();
        match adapter.save(session, content).await {
            Ok(record) => {
                info!(user_id = %session.user.user_id, %category, "worksheet saved");
                Ok(record)
            }
            Err(err) => {
                warn!(user_id = %session.user.user_id, %category, error = %err, "save failed");
                Err(err)
            }
        }
    }
}
