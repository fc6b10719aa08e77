use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, SignpostError};
use crate::config::Config;
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub config: Config,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>, config: Config) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);

        Ok(Self { store, config })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Ok(Self { store, config })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SignpostError::Config("Could not find data directory".into()))?;
        let signpost_dir = data_dir.join("signpost");
        std::fs::create_dir_all(&signpost_dir)?;
        Ok(signpost_dir.join("signpost.db"))
    }
}
