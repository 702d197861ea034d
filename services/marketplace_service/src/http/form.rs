use std::convert::Infallible;
use std::path::{Path, PathBuf};

use actix_multipart::{Multipart, MultipartError};
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use futures_util::future::LocalBoxFuture;
use futures_util::TryStreamExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use service_core::endpoint_error::EndpointError;
use service_core::operation_error::OperationError;
use thiserror::Error;

use crate::media::{AssetKind, StagedFile, UploadError};
use crate::Context;

/// Largest text field accepted in a multipart body.
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Invalid request body: {0}")]
    Body(String),

    #[error("Unexpected file field {0}.")]
    UnexpectedFile(String),

    #[error("Field {0} is too long.")]
    FieldTooLong(String),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Context is not registered with the application.")]
    MissingContext,
}

impl FormError {
    fn to_endpoint_error(&self) -> EndpointError<Infallible> {
        match self {
            FormError::Upload(UploadError::Io(e)) => {
                tracing::error!(error = ?e, "Staging upload failed.");
                EndpointError::internal()
            }
            FormError::MissingContext => {
                tracing::error!("{}", self);
                EndpointError::internal()
            }
            e => EndpointError::validation(e.to_string()),
        }
    }
}

impl ResponseError for FormError {
    fn status_code(&self) -> StatusCode {
        self.to_endpoint_error().code()
    }

    fn error_response(&self) -> HttpResponse {
        self.to_endpoint_error().error_response()
    }
}

/// Request body sent either as JSON or as `multipart/form-data`.
///
/// Multipart text fields become JSON strings; file fields are streamed into the staging directory
/// and can be taken out by their [`AssetKind`]. Staged files nobody takes are removed with the form.
#[derive(Debug, Default)]
pub struct FormBody {
    fields: Map<String, Value>,
    files: Vec<StagedFile>,
}

impl FormBody {
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, FormError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| FormError::Body(e.to_string()))
    }

    pub fn take_file(&mut self, kind: AssetKind) -> Option<StagedFile> {
        let index = self.files.iter().position(|f| f.kind() == kind)?;
        Some(self.files.swap_remove(index))
    }

    fn from_json(body: web::Bytes) -> Result<Self, FormError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(FormBody::default());
        }
        let fields = serde_json::from_slice(&body).map_err(|e| FormError::Body(e.to_string()))?;
        Ok(FormBody {
            fields,
            files: Vec::new(),
        })
    }

    async fn from_multipart(mut multipart: Multipart, staging_dir: &Path) -> Result<Self, FormError> {
        let mut form = FormBody::default();

        while let Some(mut field) = multipart.try_next().await? {
            let disposition = field.content_disposition();
            let name = disposition.get_name().unwrap_or_default().to_string();
            let file_name = disposition.get_filename().map(str::to_string);

            match file_name {
                // Browsers send an empty file part when no file was picked.
                Some(file_name) if file_name.is_empty() => {
                    while field.try_next().await?.is_some() {}
                }
                Some(file_name) => {
                    let kind = AssetKind::from_field_name(&name).ok_or_else(|| FormError::UnexpectedFile(name.clone()))?;
                    let mut staged = StagedFile::create(staging_dir, kind, &file_name)?;
                    while let Some(chunk) = field.try_next().await? {
                        staged.write_chunk(&chunk).await?;
                    }
                    staged.finish().await?;
                    tracing::debug!(field = %name, size = staged.size(), "Staged uploaded file.");
                    form.files.push(staged);
                }
                None => {
                    let mut text = Vec::new();
                    while let Some(chunk) = field.try_next().await? {
                        if text.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
                            return Err(FormError::FieldTooLong(name));
                        }
                        text.extend_from_slice(&chunk);
                    }
                    let text = String::from_utf8(text).map_err(|_| FormError::Body(format!("{name} is not UTF-8")))?;
                    form.fields.insert(name, Value::String(text));
                }
            }
        }

        Ok(form)
    }
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
}

impl FromRequest for FormBody {
    type Error = FormError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        if is_multipart(req) {
            let staging_dir: Option<PathBuf> = req
                .app_data::<web::Data<Context>>()
                .map(|ctx| ctx.media.staging_dir().to_path_buf());
            let multipart = Multipart::new(req.headers(), payload.take());
            Box::pin(async move {
                let staging_dir = staging_dir.ok_or(FormError::MissingContext)?;
                FormBody::from_multipart(multipart, &staging_dir).await
            })
        } else {
            let body = web::Bytes::from_request(req, payload);
            Box::pin(async move {
                let body = body.await.map_err(|e| FormError::Body(e.to_string()))?;
                FormBody::from_json(body)
            })
        }
    }
}
