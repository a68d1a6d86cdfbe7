mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, use_cases, pending_uploads};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, db, utils};

use auth::jwt::JwtService;
use repositories::{
    local_store::LocalObjectStore,
    object_store::StorageError,
    sqlx_repo::SqlxListingRepo,
};
use use_cases::listings::ListingHandler;

pub struct AppState {
    pub listing_handler: AppListingHandler,
    pub token_service: JwtService,
}

pub type AppListingHandler = ListingHandler<SqlxListingRepo, LocalObjectStore>;

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> Result<Self, StorageError> {
        let token_service = JwtService::new(config);
        let listing_repo = SqlxListingRepo::new(pool);
        let object_store = LocalObjectStore::new(&config.storage_root, &config.public_base_url)?;
        let listing_handler = ListingHandler::new(listing_repo, object_store, config.upload_limits());

        Ok(AppState {
            listing_handler,
            token_service,
        })
    }
}
