//! Process bootstrap
//!
//! [`Bot`] wires the configuration to a store and a transport, imports the
//! excerpt source once, then hands over to the [`PublishScheduler`] until
//! cancelled.

use crate::Result;
use crate::config::Config;
use crate::db::Database;
use crate::import::import_file;
use crate::publisher::PublishScheduler;
use crate::storage::ExcerptStore;
use crate::transport::{PostTransport, XClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Importer plus publisher, sharing one store
pub struct Bot {
    config: Config,
    store: Arc<dyn ExcerptStore>,
    transport: Arc<dyn PostTransport>,
}

impl Bot {
    /// Validate `config` and build the production collaborators
    ///
    /// Opens (and migrates) the SQLite database and prepares the API client.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let database = Database::new(&config.database.path).await?;
        let client = XClient::new(&config.twitter)?;
        info!(database = %config.database.path.display(), "Bot initialized");
        Ok(Self::with_collaborators(
            config,
            Arc::new(database),
            Arc::new(client),
        ))
    }

    /// Build a bot around existing collaborators
    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn ExcerptStore>,
        transport: Arc<dyn PostTransport>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
        }
    }

    /// The configuration this bot runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Import (when enabled), then publish until `cancel` fires
    ///
    /// An import failure is returned and the scheduler is never started.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        self.store.create_schema_if_absent().await?;

        if self.config.import.enabled {
            let report = import_file(
                self.store.as_ref(),
                &self.config.import.source_path,
                self.config.import.batch_size,
            )
            .await?;
            info!(
                excerpts = report.excerpts,
                overlength = report.overlength,
                "Startup import complete"
            );
        } else {
            info!("Startup import disabled");
        }

        if cancel.is_cancelled() {
            return Ok(());
        }

        PublishScheduler::new(self.store, self.transport, self.config.publisher)
            .run(cancel)
            .await;
        Ok(())
    }
}
