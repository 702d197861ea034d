use std::convert::Infallible;

use actix_web::{web, Responder};
use service_core::endpoint_error::EndpointError;

use crate::operations::payment_history::payment_history;
use crate::operations::Caller;
use crate::Context;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/history", web::get().to(history_handler));
}

async fn history_handler(ctx: web::Data<Context>, caller: Caller) -> Result<impl Responder, EndpointError<Infallible>> {
    payment_history(&ctx, &caller).await.map(web::Json)
}
