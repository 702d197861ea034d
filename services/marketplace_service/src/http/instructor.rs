use actix_web::{web, Responder};
use service_core::endpoint_error::EndpointError;

use crate::operations::instructor_enrollments::instructor_enrollments;
use crate::operations::instructor_revenue::instructor_revenue;
use crate::operations::instructor_stats::instructor_stats;
use crate::operations::list_instructor_courses::InstructorOnlyError;
use crate::operations::Caller;
use crate::Context;

type InstructorResult<T> = Result<T, EndpointError<InstructorOnlyError>>;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/stats", web::get().to(stats_handler))
        .route("/revenue", web::get().to(revenue_handler))
        .route("/enrollments", web::get().to(enrollments_handler));
}

async fn stats_handler(ctx: web::Data<Context>, caller: Caller) -> InstructorResult<impl Responder> {
    instructor_stats(&ctx, &caller).await.map(web::Json)
}

async fn revenue_handler(ctx: web::Data<Context>, caller: Caller) -> InstructorResult<impl Responder> {
    instructor_revenue(&ctx, &caller).await.map(web::Json)
}

async fn enrollments_handler(ctx: web::Data<Context>, caller: Caller) -> InstructorResult<impl Responder> {
    instructor_enrollments(&ctx, &caller).await.map(web::Json)
}
