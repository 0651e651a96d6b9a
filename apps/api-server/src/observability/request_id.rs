//! Request ID middleware - tags every request with a unique ID.
//!
//! An incoming `X-Request-ID` (from a client or load balancer) is kept;
//! otherwise a fresh UUID is generated. The ID is stored in request
//! extensions for handlers, recorded on the tracing span, echoed in the
//! response headers, and filled into RFC 7807 error bodies that lack one.

use actix_web::{
    Error, HttpMessage,
    body::{self, BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{self, HeaderName, HeaderValue},
    web::Bytes,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use uuid::Uuid;

use quill_shared::ErrorResponse;

/// Header name for request ID.
pub static REQUEST_ID_HEADER: &str = "X-Request-ID";

pub struct RequestIdMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = RequestIdService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdService { service }))
    }
}

pub struct RequestIdService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestIdService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        // Stash the ID in extensions for the RequestId extractor
        req.extensions_mut().insert(RequestId(request_id.clone()));

        let span = tracing::info_span!("request", request_id = %request_id);
        let _guard = span.enter();

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;

            let mut res = attach_request_id(res.map_into_boxed_body(), &request_id).await;

            res.headers_mut().insert(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_str(&request_id)
                    .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
            );

            Ok(res)
        })
    }
}

/// Fill the `request_id` member of an RFC 7807 error body that does not
/// already carry one. Non-error and non-JSON responses pass through
/// untouched.
async fn attach_request_id(
    res: ServiceResponse<BoxBody>,
    request_id: &str,
) -> ServiceResponse<BoxBody> {
    let status = res.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return res;
    }

    let is_json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return res;
    }

    let (http_req, res) = res.into_parts();
    let (head, old_body) = res.into_parts();

    let bytes = match body::to_bytes(old_body).await {
        Ok(bytes) => bytes,
        Err(_) => Bytes::new(),
    };

    let bytes = match serde_json::from_slice::<ErrorResponse>(&bytes) {
        Ok(problem) if problem.request_id.is_none() => {
            let problem = problem.with_request_id(request_id);
            serde_json::to_vec(&problem)
                .map(Bytes::from)
                .unwrap_or(bytes)
        }
        _ => bytes,
    };

    ServiceResponse::new(http_req, head.set_body(BoxBody::new(bytes)))
}

/// Request ID as seen by handlers, read from request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl actix_web::FromRequest for RequestId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId(Uuid::new_v4().to_string()));

        ready(Ok(request_id))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, test, web};
    use serde_json::Value;

    use super::*;
    use crate::middleware::error::{AppError, AppResult};

    async fn failing() -> AppResult<HttpResponse> {
        Err(AppError::NotFound("Post is gone".to_string()))
    }

    async fn echo_id(request_id: RequestId) -> HttpResponse {
        HttpResponse::Ok().body(request_id.as_str().to_string())
    }

    #[actix_web::test]
    async fn test_error_body_carries_the_request_id() {
        let app = test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .route("/fail", web::get().to(failing)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/fail")
            .insert_header((REQUEST_ID_HEADER, "req-abc-123"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), 404);
        assert_eq!(res.headers().get("x-request-id").unwrap(), "req-abc-123");

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["request_id"], "req-abc-123");
        assert_eq!(body["status"], 404);
    }

    #[actix_web::test]
    async fn test_missing_header_generates_an_id() {
        let app = test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .route("/fail", web::get().to(failing)),
        )
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/fail").to_request()).await;

        let generated = res
            .headers()
            .get("x-request-id")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(Uuid::parse_str(&generated).is_ok());

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["request_id"], generated.as_str());
    }

    #[actix_web::test]
    async fn test_success_responses_pass_through_unchanged() {
        let app = test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .route("/ok", web::get().to(|| async { HttpResponse::Ok().body("plain") })),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/ok")
            .insert_header((REQUEST_ID_HEADER, "req-ok-1"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), 200);
        assert_eq!(res.headers().get("x-request-id").unwrap(), "req-ok-1");
        assert_eq!(test::read_body(res).await, "plain");
    }

    #[actix_web::test]
    async fn test_extractor_reads_the_stashed_id() {
        let app = test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .route("/whoami", web::get().to(echo_id)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((REQUEST_ID_HEADER, "req-ext-9"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(test::read_body(res).await, "req-ext-9");
    }
}
