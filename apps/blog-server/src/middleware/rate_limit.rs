//! Rate limiting middleware.
//!
//! Only unsafe methods (POST and friends) are counted, so a resource can be
//! wrapped as a whole while its GET view stays unthrottled.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
};
use blog_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use blog_core::ports::RateLimiter;

/// Rate limiting middleware factory.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: Option<Arc<dyn RateLimiter>>,
}

impl RateLimitMiddleware {
    /// `None` lets every request through.
    pub fn new(limiter: Option<Arc<dyn RateLimiter>>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Option<Arc<dyn RateLimiter>>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = self
            .limiter
            .clone()
            .filter(|_| !req.method().is_safe());

        Box::pin(async move {
            if let Some(limiter) = limiter {
                // Socket peer only; forwarding headers are client-controlled
                let key = req
                    .peer_addr()
                    .map(|addr| addr.ip().to_string())
                    .unwrap_or_else(|| "unknown".to_string());

                match limiter.check(&key).await {
                    Ok(result) if !result.allowed => {
                        let retry_after = result.reset_after.as_millis().div_ceil(1000).max(1) as u64;
                        tracing::warn!(%key, retry_after, "Rate limit exceeded");

                        let response = HttpResponse::TooManyRequests()
                            .insert_header(("X-RateLimit-Limit", result.limit.to_string()))
                            .insert_header((header::RETRY_AFTER, retry_after.to_string()))
                            .json(ErrorResponse::too_many_requests(retry_after));

                        return Ok(req.into_response(response).map_into_right_body());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Fail open
                        tracing::error!("Rate limiter error, failing open: {}", e);
                    }
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
