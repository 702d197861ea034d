pub mod reference;
pub mod store;
pub mod upload;

pub use reference::AssetLocation;
pub use store::{MediaStore, MediaStoreError, MediaType, ResolvedMedia, SIGNED_URL_TTL_SECS, STAGING_DIR};
pub use upload::{AssetKind, StagedFile, UploadError};
