use core::fmt;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use aws_sdk_s3::config::Region;
use thiserror::Error;

use crate::course::ddb_repository::DdbCoursesRepository;
use crate::course::CoursesRepository;
use crate::enrollment::ddb_repository::DdbEnrollmentsRepository;
use crate::enrollment::EnrollmentsRepository;
use crate::media::store::{LocalMediaStore, S3MediaStore};
use crate::media::MediaStore;
use crate::user_account::ddb_repository::DdbUsersRepository;
use crate::user_account::UsersRepository;

const DEFAULT_AWS_REGION: &str = "us-east-1";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKey {
    JwtSecret,
    UsersTableName,
    CoursesTableName,
    EnrollmentsTableName,
    DynamoDbEndpoint,
    AwsRegion,
    S3Bucket,
    AwsAccessKeyId,
    AwsSecretAccessKey,
    StripeSecretKey,
    UploadDir,
    PublicBaseUrl,
    BindAddress,
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::JwtSecret => "JWT_SECRET",
            Self::UsersTableName => "USERS_TABLE_NAME",
            Self::CoursesTableName => "COURSES_TABLE_NAME",
            Self::EnrollmentsTableName => "ENROLLMENTS_TABLE_NAME",
            Self::DynamoDbEndpoint => "DYNAMODB_ENDPOINT",
            Self::AwsRegion => "AWS_REGION",
            Self::S3Bucket => "AWS_S3_BUCKET",
            Self::AwsAccessKeyId => "AWS_ACCESS_KEY_ID",
            Self::AwsSecretAccessKey => "AWS_SECRET_ACCESS_KEY",
            Self::StripeSecretKey => "STRIPE_SECRET_KEY",
            Self::UploadDir => "UPLOAD_DIR",
            Self::PublicBaseUrl => "PUBLIC_BASE_URL",
            Self::BindAddress => "BIND_ADDRESS",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Environment variable {0} not set.")]
    MissingKey(ContextKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStorageSettings {
    pub bucket: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub jwt_secret: String,
    pub users_table_name: String,
    pub courses_table_name: String,
    pub enrollments_table_name: String,
    pub dynamodb_endpoint: Option<String>,
    /// Set only when the bucket and both credentials are configured; uploads fall back to local disk
    /// otherwise.
    pub object_storage: Option<ObjectStorageSettings>,
    pub payments_enabled: bool,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub bind_address: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ContextError> {
        Self::from_lookup(|key| env::var(key.to_string()).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&ContextKey) -> Option<String>) -> Result<Self, ContextError> {
        let optional = |key: ContextKey| lookup(&key).filter(|v| !v.trim().is_empty());
        let required = |key: ContextKey| optional(key).ok_or(ContextError::MissingKey(key));

        let region = optional(ContextKey::AwsRegion).unwrap_or_else(|| DEFAULT_AWS_REGION.to_string());
        let object_storage = match (
            optional(ContextKey::S3Bucket),
            optional(ContextKey::AwsAccessKeyId),
            optional(ContextKey::AwsSecretAccessKey),
        ) {
            (Some(bucket), Some(_), Some(_)) => Some(ObjectStorageSettings { bucket, region }),
            _ => None,
        };

        Ok(Settings {
            jwt_secret: required(ContextKey::JwtSecret)?,
            users_table_name: required(ContextKey::UsersTableName)?,
            courses_table_name: required(ContextKey::CoursesTableName)?,
            enrollments_table_name: required(ContextKey::EnrollmentsTableName)?,
            dynamodb_endpoint: optional(ContextKey::DynamoDbEndpoint),
            object_storage,
            payments_enabled: optional(ContextKey::StripeSecretKey).is_some(),
            upload_dir: optional(ContextKey::UploadDir)
                .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string())
                .into(),
            public_base_url: optional(ContextKey::PublicBaseUrl)
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            bind_address: optional(ContextKey::BindAddress).unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
        })
    }
}

/// Everything an operation needs: settings plus the repositories and media store they run against.
#[derive(Clone)]
pub struct Context {
    pub settings: Settings,
    pub users: Arc<dyn UsersRepository>,
    pub courses: Arc<dyn CoursesRepository>,
    pub enrollments: Arc<dyn EnrollmentsRepository>,
    pub media: Arc<dyn MediaStore>,
}

impl Context {
    pub async fn from_settings(settings: Settings) -> Self {
        let shared_config = aws_config::load_from_env().await;

        let dynamodb_client = if let Some(endpoint) = &settings.dynamodb_endpoint {
            tracing::info!(endpoint = %endpoint, "Using DynamoDB with custom endpoint.");
            let config = aws_sdk_dynamodb::config::Builder::from(&shared_config)
                .endpoint_url(endpoint)
                .build();
            aws_sdk_dynamodb::Client::from_conf(config)
        } else {
            aws_sdk_dynamodb::Client::new(&shared_config)
        };
        let ddb: service_core::ddb::Adapter = dynamodb_client.into();

        let media: Arc<dyn MediaStore> = match &settings.object_storage {
            Some(storage) => {
                tracing::info!(bucket = %storage.bucket, region = %storage.region, "Storing media in S3.");
                let config = aws_sdk_s3::config::Builder::from(&shared_config)
                    .region(Region::new(storage.region.clone()))
                    .build();
                let s3: service_core::s3::Adapter = aws_sdk_s3::Client::from_conf(config).into();
                Arc::new(S3MediaStore::new(s3, storage.clone(), &settings.upload_dir, &settings.public_base_url))
            }
            None => {
                tracing::warn!(upload_dir = ?settings.upload_dir, "S3 not configured, storing media on local disk.");
                Arc::new(LocalMediaStore::new(&settings.upload_dir, &settings.public_base_url))
            }
        };

        Context {
            users: Arc::new(DdbUsersRepository::new(ddb.clone(), &settings.users_table_name)),
            courses: Arc::new(DdbCoursesRepository::new(ddb.clone(), &settings.courses_table_name)),
            enrollments: Arc::new(DdbEnrollmentsRepository::new(ddb, &settings.enrollments_table_name)),
            media,
            settings,
        }
    }
}
