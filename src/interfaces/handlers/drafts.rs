use actix_multipart::form::MultipartForm;
use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::image::{ImageFile, ImageUpload},
    errors::AppError,
    handlers::json_error::json_error,
    use_cases::extractors::CurrentUser,
    AppState,
};

#[instrument(skip(user, state))]
pub async fn get_draft(
    user: CurrentUser,
    state: web::Data<AppState>,
) -> impl Responder {
    let images = state.listing_handler.get_draft(&user.0);
    HttpResponse::Ok().json(serde_json::json!({
        "count": images.len(),
        "images": images
    }))
}

#[instrument(skip(user, state))]
pub async fn discard_draft(
    user: CurrentUser,
    state: web::Data<AppState>,
) -> impl Responder {
    let report = state.listing_handler.discard_draft(&user.0).await;
    HttpResponse::Ok().json(report)
}

#[instrument(skip(user, state, form))]
pub async fn add_image(
    user: CurrentUser,
    state: web::Data<AppState>,
    form: Result<MultipartForm<ImageUpload>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let form = match form {
        Ok(form) => form.into_inner(),
        Err(e) => {
            return Ok(json_error(
                StatusCode::BAD_REQUEST,
                "Upload error",
                &format!("Expected multipart/form-data with an 'image' field: {}", e),
            ));
        }
    };

    let declared_type = form.image.content_type
        .as_ref()
        .map(|mime| mime.essence_str().to_string());

    let bytes = tokio::fs::read(form.image.file.path())
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to read upload: {}", e)))?;

    let file = ImageFile::new(form.image.file_name.clone(), declared_type, bytes);

    let image = state.listing_handler.add_image(&user.0, file).await?;

    Ok(HttpResponse::Created().json(image))
}

#[instrument(skip(user, state))]
pub async fn remove_image(
    user: CurrentUser,
    name: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.listing_handler.remove_image(&user.0, &name).await?;
    Ok(HttpResponse::NoContent().finish())
}
