pub mod auth;
pub mod ddb;
pub mod endpoint_error;
pub mod operation_error;
pub mod s3;
pub mod telemetry;
