/// HTTP handlers for blog-service
///
/// Thin adapters from JSON requests to `BlogActions`; errors render through
/// `AppError`'s `ResponseError` impl.
pub mod comments;
pub mod health;
pub mod posts;
pub mod users;

pub use comments::create_comment;
pub use health::{health_check, serve_metrics};
pub use posts::{create_post, list_posts};
pub use users::{create_user, get_user, list_users};

use actix_web::web;

/// Mount every route under `/api/v1` plus `/metrics`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(serve_metrics)).service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .service(
                web::resource("/users")
                    .route(web::get().to(list_users))
                    .route(web::post().to(create_user)),
            )
            .route("/users/{id}", web::get().to(get_user))
            .service(
                web::resource("/posts")
                    .route(web::get().to(list_posts))
                    .route(web::post().to(create_post)),
            )
            .route("/comments", web::post().to(create_comment)),
    );
}
