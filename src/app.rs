//! App Core for linkvault.
//!
//! Central struct holding the database, settings, and the ingestion
//! pipeline. Built once at startup and shared with request handlers as
//! `Arc<App>`.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::database::connection::Database;
use crate::services::change_feed::ChangeFeed;
use crate::services::ingestion::IngestionCoordinator;
use crate::services::metadata_fetcher::MetadataFetcher;
use crate::types::settings::ServiceSettings;

/// Central application struct.
///
/// Link, folder, and tag managers are created on demand from
/// `db.connection()` because they borrow the locked connection.
pub struct App {
    pub db: Arc<Database>,
    pub settings: ServiceSettings,
    pub feed: Arc<ChangeFeed>,
    pub ingestion: IngestionCoordinator,
}

impl App {
    /// Opens the configured database and builds the HTTP-backed fetcher.
    pub fn new(settings: ServiceSettings) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let db_path = Path::new(&settings.storage.database_path);
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open(db_path)?;
        let fetcher = MetadataFetcher::from_settings(&settings.fetcher)?;
        info!(path = %db_path.display(), "database opened");
        Ok(Self::with_fetcher(db, settings, fetcher))
    }

    /// Assembles an App from already-built parts.
    pub fn with_fetcher(db: Database, settings: ServiceSettings, fetcher: MetadataFetcher) -> Self {
        let db = Arc::new(db);
        let feed = Arc::new(ChangeFeed::default());
        let ingestion = IngestionCoordinator::new(
            db.clone(),
            fetcher,
            feed.clone(),
            settings.ingestion.max_concurrency,
        );
        Self {
            db,
            settings,
            feed,
            ingestion,
        }
    }
}
