use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::listing::{ListingSearchQuery, NewListingForm},
    errors::AppError,
    use_cases::extractors::CurrentUser,
    AppState,
};

#[instrument(skip(state, query))]
pub async fn list_listings(
    state: web::Data<AppState>,
    query: web::Query<ListingSearchQuery>,
) -> Result<impl Responder, AppError> {
    let listings = state.listing_handler
        .list_listings(query.search.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(listings))
}

#[instrument(skip(state))]
pub async fn get_listing(
    listing_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let listing = state.listing_handler.get_listing(&listing_id).await?;
    Ok(HttpResponse::Ok().json(listing))
}

#[instrument(skip(user, state, data))]
pub async fn create_listing(
    user: CurrentUser,
    state: web::Data<AppState>,
    data: web::Json<NewListingForm>,
) -> Result<impl Responder, AppError> {
    let response = state.listing_handler
        .submit(&user.0, data.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(response))
}

#[instrument(skip(user, state))]
pub async fn delete_listing(
    user: CurrentUser,
    listing_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let report = state.listing_handler
        .delete_listing(&user.0, &listing_id)
        .await?;

    let status = if report.is_complete() { "deleted" } else { "partial_failure" };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": status,
        "report": report
    })))
}

#[instrument(skip(user, state))]
pub async fn owner_listings(
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let listings = state.listing_handler.list_owner_listings(&user.0).await?;
    Ok(HttpResponse::Ok().json(listings))
}
