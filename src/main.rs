use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use schedule_store::defaults::default_courses;
use schedule_store::services::{BootstrapService, CancelFlag};
use schedule_store::storage::FileStorage;
use schedule_store::store::CoursesStore;
use schedule_store::void::{NoopVoidClient, VoidClient, VoidConfig, VoidHttpClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "schedule_store=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let storage_dir =
        std::env::var("SCHEDULE_STORAGE_DIR").unwrap_or_else(|_| ".schedule-store".to_string());
    let storage_key =
        std::env::var("SCHEDULE_STORAGE_KEY").unwrap_or_else(|_| "zcanic_courses_v8".to_string());
    let void_key_storage_key =
        std::env::var("VOID_KEY_STORAGE_KEY").unwrap_or_else(|_| "zcanic_void_key".to_string());

    let storage = Arc::new(FileStorage::new(&storage_dir));

    let void: Arc<dyn VoidClient> = match VoidConfig::new_from_env() {
        Ok(config) => Arc::new(VoidHttpClient::new(config)?),
        Err(_) => {
            info!("VOID_API_BASE not set, remote bootstrap disabled");
            Arc::new(NoopVoidClient)
        }
    };

    let defaults = default_courses();
    let bootstrap = BootstrapService::new(
        storage.clone(),
        void,
        storage_key.clone(),
        void_key_storage_key,
    );
    let document = bootstrap.load_store(&defaults, &CancelFlag::new()).await;

    let store = CoursesStore::new(storage, storage_key, defaults, document);
    let active = store.active_semester();
    info!(
        "loaded {} semesters, active \"{}\" with {} courses and {} snapshots",
        store.semesters().len(),
        active.name,
        active.courses.len(),
        active.snapshots.len()
    );

    Ok(())
}
