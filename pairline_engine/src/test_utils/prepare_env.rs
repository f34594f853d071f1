use std::env;

use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// Creates a fresh database at `url` (dropping any leftover from a previous run) and returns a
/// migrated handle to it.
pub async fn prepare_test_db(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Nothing to drop at {url}: {e:?}");
    }
    SqliteDatabase::new_with_url(url, 5).await.expect("Error creating test database")
}

/// A unique throwaway database path in the system temp directory.
pub fn random_db_path() -> String {
    format!("sqlite://{}/pairline_test_{}.db", env::temp_dir().display(), rand::random::<u64>())
}
