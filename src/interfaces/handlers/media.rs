use actix_web::{http::header, web, HttpResponse, Responder};

use crate::{errors::AppError, AppState};

pub async fn get_image(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (uid, name) = path.into_inner();

    let bytes = state.listing_handler.read_image(&uid, &name).await?;

    let content_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    // Names are never reused, so a stored image never changes
    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .body(bytes))
}
