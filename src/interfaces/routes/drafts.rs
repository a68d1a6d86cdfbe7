use actix_web::web;

use crate::handlers::drafts;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/drafts")
            .service(
                web::resource("")
                    .route(web::get().to(drafts::get_draft))
                    .route(web::delete().to(drafts::discard_draft))
            )
            .service(
                web::resource("/images")
                    .route(web::post().to(drafts::add_image))
            )
            .service(
                web::resource("/images/{name}")
                    .route(web::delete().to(drafts::remove_image))
            )
    );
}
