use actix_web::{web, Responder};
use service_core::endpoint_error::EndpointError;
use uuid::Uuid;

use super::caller::OptionalCaller;
use crate::operations::get_media_url::{get_media_url, GetMediaUrlError, MediaRequest};
use crate::Context;

type MediaResult<T> = Result<T, EndpointError<GetMediaUrlError>>;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/thumbnail/public/{id}", web::get().to(public_thumbnail_handler))
        .route("/thumbnail/{id}", web::get().to(thumbnail_handler))
        .route("/profile/{id}", web::get().to(profile_image_handler))
        .route("/{id}", web::get().to(video_handler));
}

async fn respond(ctx: &Context, caller: OptionalCaller, request: MediaRequest) -> MediaResult<impl Responder> {
    get_media_url(ctx, caller.0.as_ref(), request).await.map(web::Json)
}

async fn video_handler(ctx: web::Data<Context>, caller: OptionalCaller, path: web::Path<Uuid>) -> MediaResult<impl Responder> {
    respond(&ctx, caller, MediaRequest::CourseVideo(path.into_inner())).await
}

async fn thumbnail_handler(
    ctx: web::Data<Context>,
    caller: OptionalCaller,
    path: web::Path<Uuid>,
) -> MediaResult<impl Responder> {
    respond(&ctx, caller, MediaRequest::CourseThumbnail(path.into_inner())).await
}

async fn public_thumbnail_handler(ctx: web::Data<Context>, path: web::Path<Uuid>) -> MediaResult<impl Responder> {
    respond(&ctx, OptionalCaller(None), MediaRequest::PublicThumbnail(path.into_inner())).await
}

async fn profile_image_handler(
    ctx: web::Data<Context>,
    caller: OptionalCaller,
    path: web::Path<Uuid>,
) -> MediaResult<impl Responder> {
    respond(&ctx, caller, MediaRequest::ProfileImage(path.into_inner())).await
}
