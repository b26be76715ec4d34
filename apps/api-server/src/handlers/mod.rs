//! HTTP handlers and route configuration.

mod auth;
mod blog;
mod health;
mod moderation;
mod portfolio;
mod present;

#[cfg(test)]
mod tests;

use actix_web::web;

use crate::middleware::error::{json_config, path_config, query_config};
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Register the shared state, extractor configs and every route.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(state.tokens.clone()))
            .app_data(path_config())
            .app_data(query_config())
            .app_data(json_config());
        let throttle = RateLimitMiddleware::new(state.comment_limiter.clone())
            .trust_forwarded(state.trust_proxy_headers);
        cfg.app_data(web::Data::new(state));
        configure_routes(cfg, throttle);
    }
}

/// Configure all application routes.
fn configure_routes(cfg: &mut web::ServiceConfig, comment_throttle: RateLimitMiddleware) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/categories/", web::get().to(blog::list_categories))
            .route("/posts/", web::get().to(blog::list_posts))
            .route("/posts/{slug}/", web::get().to(blog::get_post))
            .route("/comments/", web::get().to(blog::list_comments))
            .service(
                web::resource("/comments/add/")
                    .wrap(comment_throttle)
                    .route(web::post().to(blog::submit_comment)),
            )
            // Auth routes
            .route("/token/", web::post().to(auth::obtain_token))
            .route("/token/refresh/", web::post().to(auth::refresh_token))
            .route("/auth/me/", web::get().to(auth::me))
            // Moderation routes (staff only)
            .service(
                web::scope("/moderation/comments")
                    .route("/pending/", web::get().to(moderation::pending_comments))
                    .route(
                        "/{id}/toggle-approve/",
                        web::patch().to(moderation::toggle_approve),
                    )
                    .route("/approve/", web::post().to(moderation::approve_selected)),
            )
            // Portfolio routes
            .service(
                web::scope("/portfolio")
                    .route("/projects/", web::get().to(portfolio::list_projects))
                    .route("/projects/{slug}/", web::get().to(portfolio::get_project))
                    .route("/skills/", web::get().to(portfolio::list_skills)),
            ),
    );
}
