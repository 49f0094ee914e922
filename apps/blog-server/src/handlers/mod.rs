//! HTTP handlers and route configuration.

mod blog;
mod health;
mod present;
mod sitemap;

use std::sync::Arc;

use actix_web::error::{QueryPayloadError, UrlencodedError};
use actix_web::{HttpRequest, HttpResponse, web};
use blog_core::ports::RateLimiter;

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit::RateLimitMiddleware;

/// Scheme and host the client used, e.g. `https://blog.example.com`.
pub(crate) fn request_origin(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

/// Largest share or comment form body accepted, in bytes.
pub const FORM_LIMIT: usize = 256 * 1024;

fn form_error(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        UrlencodedError::Overflow { size, limit } => AppError::PayloadTooLarge(format!(
            "Form body of {size} bytes exceeds the {limit} byte limit"
        )),
        UrlencodedError::ContentType => AppError::UnsupportedMediaType(
            "Expected an application/x-www-form-urlencoded body".to_string(),
        ),
        other => AppError::BadRequest(other.to_string()),
    }
    .into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!("No route matches {}", req.path())))
}

/// Configure all application routes.
///
/// Share and comment submissions go through `limiter` when one is given.
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiter: Option<Arc<dyn RateLimiter>>) {
    let throttle = RateLimitMiddleware::new(limiter);

    cfg.app_data(
        web::FormConfig::default()
            .limit(FORM_LIMIT)
            .error_handler(form_error),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error))
    .service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check)),
    )
    .route("/sitemap.xml", web::get().to(sitemap::sitemap))
    .service(
        web::scope("/blog")
            .route("/", web::get().to(blog::post_list))
            .route("/search/", web::get().to(blog::post_search))
            .route("/tag/{tag_slug}/", web::get().to(blog::post_list_by_tag))
            .route(
                "/{year}/{month}/{day}/{post}/",
                web::get().to(blog::post_detail),
            )
            .service(
                web::resource("/{post_id}/share/")
                    .wrap(throttle.clone())
                    .route(web::get().to(blog::share_form))
                    .route(web::post().to(blog::share_post)),
            )
            .service(
                web::resource("/{post_id}/comment/")
                    .wrap(throttle)
                    .route(web::post().to(blog::post_comment))
                    .default_service(web::to(blog::comment_method_not_allowed)),
            ),
    )
    .default_service(web::to(not_found));
}

#[cfg(test)]
mod tests;
