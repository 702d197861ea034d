pub mod adapter;
pub mod delete_object;
pub mod presign_get_object;
pub mod put_object;

pub use adapter::Adapter;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Failed to read object body: {0}")]
    Body(#[source] BoxError),
    #[error("Failed to presign request: {0}")]
    Presigning(#[source] BoxError),
    #[error("Object store request failed: {0}")]
    Service(#[source] BoxError),
}
