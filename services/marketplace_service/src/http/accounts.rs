use actix_web::http::StatusCode;
use actix_web::{web, Responder};
use serde_json::json;
use service_core::endpoint_error::EndpointError;

use super::form::FormBody;
use crate::media::AssetKind;
use crate::operations::authenticate::{authenticate, AuthenticateError, AuthenticateInput};
use crate::operations::describe_account::{describe_account, DescribeAccountError};
use crate::operations::register::{register, RegisterInput};
use crate::operations::update_account::{update_account, UpdateAccountInput};
use crate::operations::Caller;
use crate::Context;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/register", web::post().to(register_handler))
        .route("/login", web::post().to(login_handler))
        .service(
            web::resource("/me")
                .route(web::get().to(me_handler))
                .route(web::put().to(update_me_handler)),
        );
}

async fn register_handler(ctx: web::Data<Context>, mut form: FormBody) -> actix_web::Result<impl Responder> {
    let input: RegisterInput = form.parse()?;
    let profile_image = form.take_file(AssetKind::ProfileImage);

    let output = register(&ctx, input, profile_image).await?;
    Ok((web::Json(output), StatusCode::CREATED))
}

async fn login_handler(
    ctx: web::Data<Context>,
    input: web::Json<AuthenticateInput>,
) -> Result<impl Responder, EndpointError<AuthenticateError>> {
    authenticate(&ctx, input.into_inner()).await.map(web::Json)
}

async fn me_handler(ctx: web::Data<Context>, caller: Caller) -> Result<impl Responder, EndpointError<DescribeAccountError>> {
    let user = describe_account(&ctx, &caller).await?;
    Ok(web::Json(json!({ "user": user })))
}

async fn update_me_handler(ctx: web::Data<Context>, caller: Caller, mut form: FormBody) -> actix_web::Result<impl Responder> {
    let input: UpdateAccountInput = form.parse()?;
    let profile_image = form.take_file(AssetKind::ProfileImage);

    let output = update_account(&ctx, &caller, input, profile_image).await?;
    Ok(web::Json(output))
}
