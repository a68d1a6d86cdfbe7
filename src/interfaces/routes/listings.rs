use actix_web::web;

use crate::handlers::listings;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/listings")
            .service(
                web::resource("")
                    .route(web::get().to(listings::list_listings))
                    .route(web::post().to(listings::create_listing))
            )
            .service(
                web::resource("/{listing_id}")
                    .route(web::get().to(listings::get_listing))
                    .route(web::delete().to(listings::delete_listing))
            )
    );

    cfg.service(
        web::resource("/dashboard/listings")
            .route(web::get().to(listings::owner_listings))
    );
}
