use std::convert::Infallible;

use actix_web::http::StatusCode;
use actix_web::{web, Responder};
use serde_json::json;
use service_core::endpoint_error::EndpointError;
use uuid::Uuid;

use super::caller::OptionalCaller;
use super::form::FormBody;
use crate::course::{CourseAsset, CourseQuery};
use crate::media::AssetKind;
use crate::operations::create_course::{create_course, CreateCourseError, CreateCourseInput};
use crate::operations::create_course_with_media::create_course_with_media;
use crate::operations::describe_course::{describe_course, DescribeCourseError};
use crate::operations::enroll::{enroll, EnrollError};
use crate::operations::enrollment_status::enrollment_status;
use crate::operations::filter_options::filter_options;
use crate::operations::list_courses::list_courses;
use crate::operations::list_enrolled_courses::list_enrolled_courses;
use crate::operations::list_instructor_courses::{list_instructor_courses, InstructorOnlyError};
use crate::operations::post_review::{post_review, PostReviewError, PostReviewInput};
use crate::operations::update_course::{update_course, UpdateCourseError, UpdateCourseInput};
use crate::operations::update_course_status::{update_course_status, UpdateCourseStatusError, UpdateCourseStatusInput};
use crate::operations::upload_course_asset::{upload_course_asset, UploadCourseAssetOutput};
use crate::operations::Caller;
use crate::Context;

/// Literal paths are registered ahead of `/{id}` so that they are not taken for course ids.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_handler))
            .route(web::post().to(create_handler)),
    )
    .route("/filters/options", web::get().to(filter_options_handler))
    .route("/instructor/my-courses", web::get().to(instructor_courses_handler))
    .route("/student/enrolled", web::get().to(enrolled_courses_handler))
    .route("/create-with-video", web::post().to(create_with_media_handler))
    .service(
        web::resource("/{id}")
            .route(web::get().to(describe_handler))
            .route(web::put().to(update_handler)),
    )
    .route("/{id}/status", web::patch().to(update_status_handler))
    .route("/{id}/enroll", web::post().to(enroll_handler))
    .route("/{id}/enrollment-status", web::get().to(enrollment_status_handler))
    .route("/{id}/reviews", web::post().to(review_handler))
    .route("/{id}/video", web::post().to(upload_video_handler))
    .route("/{id}/thumbnail", web::post().to(upload_thumbnail_handler));
}

async fn list_handler(
    ctx: web::Data<Context>,
    caller: OptionalCaller,
    query: web::Query<CourseQuery>,
) -> Result<impl Responder, EndpointError<Infallible>> {
    let courses = list_courses(&ctx, caller.0.as_ref(), &query).await?;
    Ok(web::Json(json!({ "courses": courses })))
}

async fn describe_handler(
    ctx: web::Data<Context>,
    caller: OptionalCaller,
    path: web::Path<Uuid>,
) -> Result<impl Responder, EndpointError<DescribeCourseError>> {
    let course = describe_course(&ctx, caller.0.as_ref(), &path).await?;
    let enrolled = course.enrolled.unwrap_or(false);
    Ok(web::Json(json!({ "course": course, "enrolled": enrolled })))
}

async fn filter_options_handler(ctx: web::Data<Context>) -> Result<impl Responder, EndpointError<Infallible>> {
    filter_options(&ctx).await.map(web::Json)
}

async fn create_handler(
    ctx: web::Data<Context>,
    caller: Caller,
    input: web::Json<CreateCourseInput>,
) -> Result<impl Responder, EndpointError<CreateCourseError>> {
    let output = create_course(&ctx, &caller, input.into_inner()).await?;
    Ok((web::Json(output), StatusCode::CREATED))
}

async fn create_with_media_handler(
    ctx: web::Data<Context>,
    caller: Caller,
    mut form: FormBody,
) -> actix_web::Result<impl Responder> {
    let input: CreateCourseInput = form.parse()?;
    let video = form.take_file(AssetKind::Video);
    let thumbnail = form.take_file(AssetKind::Thumbnail);

    let output = create_course_with_media(&ctx, &caller, input, video, thumbnail).await?;
    Ok((web::Json(output), StatusCode::CREATED))
}

async fn update_handler(
    ctx: web::Data<Context>,
    caller: Caller,
    path: web::Path<Uuid>,
    input: web::Json<UpdateCourseInput>,
) -> Result<impl Responder, EndpointError<UpdateCourseError>> {
    update_course(&ctx, &caller, &path, input.into_inner()).await.map(web::Json)
}

async fn update_status_handler(
    ctx: web::Data<Context>,
    caller: Caller,
    path: web::Path<Uuid>,
    input: web::Json<UpdateCourseStatusInput>,
) -> Result<impl Responder, EndpointError<UpdateCourseStatusError>> {
    update_course_status(&ctx, &caller, &path, &input).await.map(web::Json)
}

async fn upload_asset(
    ctx: &Context,
    caller: &Caller,
    course_id: &Uuid,
    asset: CourseAsset,
    mut form: FormBody,
) -> actix_web::Result<web::Json<UploadCourseAssetOutput>> {
    let staged = form
        .take_file(AssetKind::from(asset))
        .ok_or_else(|| EndpointError::<Infallible>::validation(format!("No {asset} file uploaded")))?;

    let output = upload_course_asset(ctx, caller, course_id, asset, staged).await?;
    Ok(web::Json(output))
}

async fn upload_video_handler(
    ctx: web::Data<Context>,
    caller: Caller,
    path: web::Path<Uuid>,
    form: FormBody,
) -> actix_web::Result<impl Responder> {
    upload_asset(&ctx, &caller, &path, CourseAsset::Video, form).await
}

async fn upload_thumbnail_handler(
    ctx: web::Data<Context>,
    caller: Caller,
    path: web::Path<Uuid>,
    form: FormBody,
) -> actix_web::Result<impl Responder> {
    upload_asset(&ctx, &caller, &path, CourseAsset::Thumbnail, form).await
}

async fn instructor_courses_handler(
    ctx: web::Data<Context>,
    caller: Caller,
) -> Result<impl Responder, EndpointError<InstructorOnlyError>> {
    let courses = list_instructor_courses(&ctx, &caller).await?;
    Ok(web::Json(json!({ "courses": courses })))
}

async fn enrolled_courses_handler(
    ctx: web::Data<Context>,
    caller: Caller,
) -> Result<impl Responder, EndpointError<Infallible>> {
    let courses = list_enrolled_courses(&ctx, &caller).await?;
    Ok(web::Json(json!({ "courses": courses })))
}

async fn enroll_handler(
    ctx: web::Data<Context>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<impl Responder, EndpointError<EnrollError>> {
    enroll(&ctx, &caller, &path).await.map(web::Json)
}

async fn enrollment_status_handler(
    ctx: web::Data<Context>,
    caller: Caller,
    path: web::Path<Uuid>,
) -> Result<impl Responder, EndpointError<Infallible>> {
    enrollment_status(&ctx, &caller, &path).await.map(web::Json)
}

async fn review_handler(
    ctx: web::Data<Context>,
    caller: Caller,
    path: web::Path<Uuid>,
    input: web::Json<PostReviewInput>,
) -> Result<impl Responder, EndpointError<PostReviewError>> {
    post_review(&ctx, &caller, &path, input.into_inner()).await.map(web::Json)
}
