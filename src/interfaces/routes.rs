use actix_web::web;

use crate::handlers::home::home;

mod drafts;
mod json_error;
mod listings;
mod media;
mod system;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope("/api/v1")
            .configure(system::config_routes)
            .configure(listings::config_routes)
            .configure(drafts::config_routes)
    );

    cfg.configure(media::config_routes);
    cfg.configure(json_error::config_routes);
}
