use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{Error, HttpMessage};
use tracing_actix_web::RequestId;

/// Header carrying the id `TracingLogger` gave the request.
pub const REQUEST_ID_HEADER: &str = "x-uc-request-id";

/// Copies the request id into the response so clients can quote it when reporting a failure.
/// Install with `middleware::from_fn`, inside `TracingLogger`; without it the header is left out.
pub async fn echo_request_id(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let request_id = req.extensions().get::<RequestId>().cloned();
    if request_id.is_none() {
        tracing::warn!(path = req.path(), "Request reached the API without a request id.");
    }

    let mut res = next.call(req).await?;
    if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(&id.to_string()).ok()) {
        res.headers_mut().insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    Ok(res)
}
