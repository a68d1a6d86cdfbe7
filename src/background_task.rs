use actix_web::web;
use tokio::time::{interval, Duration};

use crate::AppState;

/// Periodically deletes drafts, and their images, that nobody submitted.
pub async fn start_draft_purge_task(state: web::Data<AppState>, every: Duration, ttl: chrono::Duration) {
    let mut interval = interval(every);

    loop {
        interval.tick().await;

        let report = state.listing_handler.purge_expired_drafts(ttl).await;

        if report.orphaned_images.is_empty() {
            if report.removed_images > 0 {
                tracing::info!("Purged {} images from expired drafts", report.removed_images);
            }
        } else {
            tracing::error!(
                "Draft purge removed {} images, {} could not be removed",
                report.removed_images,
                report.orphaned_images.len()
            );
        }
    }
}
