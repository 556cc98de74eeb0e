use std::sync::Arc;

use storage::repository::{SessionStore, Storage};

use crate::Clock;
use crate::error::AppServicesError;
use crate::sessions::{ResultsService, SessionInitializer, SessionSetupService};

/// Assembles the app-facing quiz services over one session store.
#[derive(Clone)]
pub struct AppServices {
    setup: Arc<SessionSetupService>,
    initializer: Arc<SessionInitializer>,
    results: Arc<ResultsService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, scoped to `scope`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        scope: &str,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url, scope).await?;
        Ok(Self::from_store(storage.session, clock))
    }

    /// Build services over a process-local store.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_store(Storage::in_memory().session, clock)
    }

    #[must_use]
    pub fn from_store(store: Arc<dyn SessionStore>, clock: Clock) -> Self {
        Self {
            setup: Arc::new(SessionSetupService::new(clock.clone(), Arc::clone(&store))),
            initializer: Arc::new(SessionInitializer::new(clock.clone(), Arc::clone(&store))),
            results: Arc::new(ResultsService::new(clock, store)),
        }
    }

    #[must_use]
    pub fn setup(&self) -> Arc<SessionSetupService> {
        Arc::clone(&self.setup)
    }

    #[must_use]
    pub fn initializer(&self) -> Arc<SessionInitializer> {
        Arc::clone(&self.initializer)
    }

    #[must_use]
    pub fn results(&self) -> Arc<ResultsService> {
        Arc::clone(&self.results)
    }
}
