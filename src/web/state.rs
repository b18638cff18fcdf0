use crate::services::buckets::BucketCatalog;
use crate::services::loader::LoaderOptions;
use crate::services::storage::{StorageHandle, StorageProvider};
use crate::{Config, Database};

pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub storage: StorageHandle,
    pub catalog: BucketCatalog,
    pub loader: LoaderOptions,
}

impl AppState {
    pub fn new(config: Config, db: Database, storage: StorageHandle) -> Self {
        let catalog = BucketCatalog::new(storage.provider.clone(), config.storage.default_bucket.clone());
        let loader = LoaderOptions::from(&config);
        Self {
            config,
            db,
            storage,
            catalog,
            loader,
        }
    }

    pub fn provider(&self) -> &dyn StorageProvider {
        self.storage.provider.as_ref()
    }
}
