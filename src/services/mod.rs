// linkvault services
// Services provide the ingestion pipeline plus settings, logging, and change notification.

pub mod change_feed;
pub mod ingestion;
pub mod logging;
pub mod metadata_fetcher;
pub mod settings_engine;
pub mod url_normalizer;
