use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::reference::{AssetLocation, LOCAL_PREFIX};
use crate::course::CourseAsset;

const MIB: u64 = 1024 * 1024;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "flv", "webm"];
const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Video,
    Thumbnail,
    ProfileImage,
}

impl AssetKind {
    /// Name of the multipart field carrying this kind of file.
    pub fn field_name(self) -> &'static str {
        match self {
            AssetKind::Video => "video",
            AssetKind::Thumbnail => "thumbnail",
            AssetKind::ProfileImage => "profileImage",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        [AssetKind::Video, AssetKind::Thumbnail, AssetKind::ProfileImage]
            .into_iter()
            .find(|kind| kind.field_name() == name)
    }

    pub fn max_bytes(self) -> u64 {
        match self {
            AssetKind::Video => 500 * MIB,
            AssetKind::Thumbnail | AssetKind::ProfileImage => 5 * MIB,
        }
    }

    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            AssetKind::Video => VIDEO_EXTENSIONS,
            AssetKind::Thumbnail | AssetKind::ProfileImage => IMAGE_EXTENSIONS,
        }
    }

    pub fn content_type(self, file_name: &str) -> &'static str {
        if self == AssetKind::Video {
            return "video/mp4";
        }

        match extension(file_name).as_deref() {
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        }
    }

    fn object_folder(self) -> &'static str {
        match self {
            AssetKind::Video => "courses/videos",
            AssetKind::Thumbnail => "courses/thumbnails",
            AssetKind::ProfileImage => "users",
        }
    }

    /// Object key for a file uploaded for the course or user `owner_id`.
    pub fn object_key(self, owner_id: &Uuid, file_name: &str, millis: i64) -> String {
        format!("{}/{owner_id}-{millis}-{file_name}", self.object_folder())
    }

    /// Whether `reference` names a file of this kind that was stored for `owner_id`, in the
    /// object store or in the upload directory.
    pub fn issued_for(self, owner_id: &Uuid, reference: &str) -> bool {
        match AssetLocation::parse(reference) {
            Ok(AssetLocation::ObjectStore { key }) => {
                key.starts_with(&format!("{}/{owner_id}-", self.object_folder())) && !key.contains("..")
            }
            Ok(AssetLocation::Local { path }) => path
                .strip_prefix(LOCAL_PREFIX)
                .map_or(false, |name| {
                    !name.contains(&['/', '\\'][..]) && name.starts_with(&format!("{}-{owner_id}-", self.local_prefix()))
                }),
            Err(_) => false,
        }
    }

    /// Object metadata key naming the owner of the uploaded file.
    pub fn owner_metadata_key(self) -> &'static str {
        match self {
            AssetKind::Video | AssetKind::Thumbnail => "course-id",
            AssetKind::ProfileImage => "user-id",
        }
    }

    fn local_prefix(self) -> &'static str {
        match self {
            AssetKind::Video => "video",
            AssetKind::Thumbnail => "thumbnail",
            AssetKind::ProfileImage => "profile",
        }
    }
}

impl From<CourseAsset> for AssetKind {
    fn from(asset: CourseAsset) -> Self {
        match asset {
            CourseAsset::Video => AssetKind::Video,
            CourseAsset::Thumbnail => AssetKind::Thumbnail,
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only {0} files are allowed.")]
    UnsupportedType(String),

    #[error("File is larger than the {0} MB limit.")]
    TooLarge(u64),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Keeps only the last path component of a client supplied file name.
pub fn sanitize_file_name(file_name: &str) -> String {
    let name = file_name.rsplit(&['/', '\\'][..]).next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." {
        "file".to_string()
    } else {
        name.to_string()
    }
}

/// An upload being streamed to a temporary file in the staging directory.
///
/// The temporary file is removed when the value is dropped, whatever happened to the upload, unless
/// it was moved into the upload directory with [`StagedFile::persist_into`].
#[derive(Debug)]
pub struct StagedFile {
    kind: AssetKind,
    file_name: String,
    size: u64,
    temp: NamedTempFile,
    out: tokio::fs::File,
}

impl StagedFile {
    pub fn create(staging_dir: &Path, kind: AssetKind, file_name: &str) -> Result<Self, UploadError> {
        let file_name = sanitize_file_name(file_name);
        let allowed = kind.allowed_extensions();
        if !extension(&file_name).map_or(false, |e| allowed.contains(&e.as_str())) {
            return Err(UploadError::UnsupportedType(allowed.join(", ")));
        }

        let temp = tempfile::Builder::new().prefix("upload-").tempfile_in(staging_dir)?;
        let out = tokio::fs::File::from_std(temp.as_file().try_clone()?);

        Ok(StagedFile {
            kind,
            file_name,
            size: 0,
            temp,
            out,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        self.size += chunk.len() as u64;
        if self.size > self.kind.max_bytes() {
            return Err(UploadError::TooLarge(self.kind.max_bytes() / MIB));
        }

        self.out.write_all(chunk).await?;
        Ok(())
    }

    /// Flushes buffered bytes; call once the whole upload was written.
    pub async fn finish(&mut self) -> Result<(), UploadError> {
        self.out.flush().await?;
        Ok(())
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn content_type(&self) -> &'static str {
        self.kind.content_type(&self.file_name)
    }

    /// Moves the file into `dir` under a generated name that starts with the kind and `owner_id`,
    /// and returns that name.
    pub fn persist_into(self, dir: &Path, owner_id: &Uuid) -> Result<String, UploadError> {
        let StagedFile {
            kind,
            file_name,
            temp,
            out,
            ..
        } = self;
        drop(out);

        let stored_name = format!(
            "{}-{}-{}-{}.{}",
            kind.local_prefix(),
            owner_id,
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension(&file_name).unwrap_or_default()
        );
        let target: PathBuf = dir.join(&stored_name);
        temp.persist(&target).map_err(|e| UploadError::Io(e.error))?;

        Ok(stored_name)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(AssetKind::Video, "intro.MP4", true)]
    #[case(AssetKind::Video, "intro.webm", true)]
    #[case(AssetKind::Video, "intro.png", false)]
    #[case(AssetKind::Thumbnail, "cover.jpeg", true)]
    #[case(AssetKind::Thumbnail, "cover.webp", false)]
    #[case(AssetKind::ProfileImage, "me.gif", true)]
    #[case(AssetKind::ProfileImage, "me", false)]
    fn extension_must_be_allowed(#[case] kind: AssetKind, #[case] name: &str, #[case] accepted: bool) {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedFile::create(dir.path(), kind, name);

        assert_eq!(staged.is_ok(), accepted);
    }

    #[rstest]
    #[case(AssetKind::Video, "a.mov", "video/mp4")]
    #[case(AssetKind::Thumbnail, "a.PNG", "image/png")]
    #[case(AssetKind::Thumbnail, "a.gif", "image/gif")]
    #[case(AssetKind::ProfileImage, "a.webp", "image/webp")]
    #[case(AssetKind::ProfileImage, "a.jpg", "image/jpeg")]
    fn content_type_by_kind_and_extension(#[case] kind: AssetKind, #[case] name: &str, #[case] expected: &str) {
        assert_eq!(kind.content_type(name), expected);
    }

    #[test]
    fn kinds_are_found_by_field_name() {
        assert_eq!(AssetKind::from_field_name("profileImage"), Some(AssetKind::ProfileImage));
        assert_eq!(AssetKind::from_field_name("video"), Some(AssetKind::Video));
        assert_eq!(AssetKind::from_field_name("avatar"), None);
    }

    #[test]
    fn object_keys_follow_owner_layout() {
        let owner = Uuid::nil();

        assert_eq!(
            AssetKind::Video.object_key(&owner, "intro.mp4", 1700000000000),
            format!("courses/videos/{owner}-1700000000000-intro.mp4")
        );
        assert_eq!(
            AssetKind::Thumbnail.object_key(&owner, "cover.png", 1),
            format!("courses/thumbnails/{owner}-1-cover.png")
        );
        assert_eq!(
            AssetKind::ProfileImage.object_key(&owner, "me.jpg", 2),
            format!("users/{owner}-2-me.jpg")
        );
    }

    #[test]
    fn file_names_lose_their_directories() {
        assert_eq!(sanitize_file_name("C:\\Users\\me\\cover.png"), "cover.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(".."), "file");
    }

    #[tokio::test]
    async fn temp_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let mut staged = StagedFile::create(dir.path(), AssetKind::Thumbnail, "cover.png").unwrap();
        staged.write_chunk(b"png bytes").await.unwrap();
        staged.finish().await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut staged = StagedFile::create(dir.path(), AssetKind::ProfileImage, "me.png").unwrap();
        let chunk = vec![0u8; (MIB as usize) + 1];

        for _ in 0..4 {
            staged.write_chunk(&chunk).await.unwrap();
        }
        let err = staged.write_chunk(&chunk).await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge(5)));
    }

    #[tokio::test]
    async fn persisted_file_keeps_its_bytes() {
        let staging = tempfile::tempdir().unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let mut staged = StagedFile::create(staging.path(), AssetKind::Video, "intro.mp4").unwrap();
        staged.write_chunk(b"frames").await.unwrap();
        staged.finish().await.unwrap();

        let owner = Uuid::new_v4();
        let name = staged.persist_into(uploads.path(), &owner).unwrap();

        assert!(name.starts_with(&format!("video-{owner}-")) && name.ends_with(".mp4"));
        assert!(AssetKind::Video.issued_for(&owner, &format!("/uploads/{name}")));
        assert_eq!(std::fs::read(uploads.path().join(&name)).unwrap(), b"frames");
    }

    #[test]
    fn references_are_tied_to_owner_and_kind() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let key = AssetKind::Video.object_key(&owner, "intro.mp4", 1_700_000_000_000);
        let object = crate::media::reference::object_url("media", "us-east-1", &key);
        let local = format!("/uploads/video-{owner}-1700000000000-abc.mp4");

        assert!(AssetKind::Video.issued_for(&owner, &object));
        assert!(AssetKind::Video.issued_for(&owner, &local));
        assert!(!AssetKind::Video.issued_for(&other, &object));
        assert!(!AssetKind::Video.issued_for(&other, &local));
        assert!(!AssetKind::Thumbnail.issued_for(&owner, &object));
        assert!(!AssetKind::Thumbnail.issued_for(&owner, &local));
        assert!(!AssetKind::Video.issued_for(&owner, &format!("/uploads/x/../video-{owner}-1.mp4")));
        assert!(!AssetKind::Video.issued_for(&owner, &format!("https://elsewhere.example/video-{owner}-1.mp4")));
        assert!(!AssetKind::Video.issued_for(&owner, "   "));
    }
}
