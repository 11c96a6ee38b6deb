use crate::db::Database;
use crate::observability::metrics::Metrics;
use crate::storage::ImageStore;

pub struct AppState {
    pub db: Database,
    pub images: ImageStore,
    pub metrics: Metrics,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(db: Database, images: ImageStore, max_upload_bytes: usize) -> Self {
        Self {
            db,
            images,
            metrics: Metrics::new(),
            max_upload_bytes,
        }
    }
}
