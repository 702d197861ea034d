//! In-memory stand-ins for the repositories and the object store, with the same write conditions
//! as the DynamoDB and S3 backed implementations.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use service_core::s3::delete_object::{DeleteObject, DeleteObjectInput};
use service_core::s3::presign_get_object::{PresignGetObject, PresignGetObjectInput};
use service_core::s3::put_object::{PutObject, PutObjectInput};
use service_core::s3::ObjectStoreError;
use tempfile::TempDir;
use uuid::Uuid;

use crate::context::ObjectStorageSettings;
use crate::course::lifecycle::{apply_transition, published_flag};
use crate::course::{Course, CourseChanges, CourseStatus, CoursesRepository, Review};
use crate::enrollment::{Enrollment, EnrollmentsRepository, PaymentStatus};
use crate::media::reference::object_url;
use crate::media::store::{LocalMediaStore, S3MediaStore};
use crate::media::{AssetKind, MediaStore, MediaStoreError, ResolvedMedia, StagedFile};
use crate::operations::Caller;
use crate::repository::RepositoryError;
use crate::user_account::{hash_password, ProfileUpdate, UserAccount, UserLookup, UsersRepository};
use crate::{Context, Settings};

pub(crate) const BUCKET: &str = "media";
pub(crate) const REGION: &str = "us-east-1";

#[derive(Default)]
pub(crate) struct InMemoryUsers {
    by_email: Mutex<HashMap<String, UserAccount>>,
}

#[async_trait]
impl UsersRepository for InMemoryUsers {
    async fn create_user(&self, user: &UserAccount) -> Result<(), RepositoryError> {
        let mut users = self.by_email.lock().unwrap();
        if users.contains_key(&user.email) {
            return Err(RepositoryError::Duplicate);
        }
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, lookup: &UserLookup) -> Result<UserAccount, RepositoryError> {
        let users = self.by_email.lock().unwrap();
        let found = match lookup {
            UserLookup::ByEmail(email) => users.get(email),
            UserLookup::ById(id) => users.values().find(|u| &u.user_id == id),
        };
        found.cloned().ok_or(RepositoryError::NotFound)
    }

    async fn update_profile(&self, user_id: &Uuid, update: &ProfileUpdate) -> Result<UserAccount, RepositoryError> {
        let mut users = self.by_email.lock().unwrap();
        let user = users
            .values_mut()
            .find(|u| &u.user_id == user_id)
            .ok_or(RepositoryError::NotFound)?;
        update.apply(user);
        Ok(user.clone())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryCourses {
    courses: Mutex<HashMap<Uuid, Course>>,
}

#[async_trait]
impl CoursesRepository for InMemoryCourses {
    async fn create_course(&self, course: &Course) -> Result<(), RepositoryError> {
        let mut courses = self.courses.lock().unwrap();
        if courses.contains_key(&course.course_id) {
            return Err(RepositoryError::Duplicate);
        }
        courses.insert(course.course_id, course.clone());
        Ok(())
    }

    async fn get_course(&self, course_id: &Uuid) -> Result<Course, RepositoryError> {
        let courses = self.courses.lock().unwrap();
        courses.get(course_id).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn list_courses(&self) -> Result<Vec<Course>, RepositoryError> {
        Ok(self.courses.lock().unwrap().values().cloned().collect())
    }

    async fn list_courses_by_instructor(&self, instructor_id: &Uuid) -> Result<Vec<Course>, RepositoryError> {
        let courses = self.courses.lock().unwrap();
        Ok(courses
            .values()
            .filter(|c| &c.instructor_id == instructor_id)
            .cloned()
            .collect())
    }

    async fn update_details(&self, course_id: &Uuid, changes: &CourseChanges) -> Result<Course, RepositoryError> {
        let mut courses = self.courses.lock().unwrap();
        let course = courses.get_mut(course_id).ok_or(RepositoryError::NotFound)?;
        changes.apply(course);
        course.updated_at = Utc::now();
        Ok(course.clone())
    }

    async fn update_status(
        &self,
        course_id: &Uuid,
        expected: Option<CourseStatus>,
        status: CourseStatus,
    ) -> Result<Course, RepositoryError> {
        let mut courses = self.courses.lock().unwrap();
        let course = courses.get_mut(course_id).ok_or(RepositoryError::ConditionFailed)?;
        if course.status != expected || (status == CourseStatus::Archived && course.enrollment_count > 0) {
            return Err(RepositoryError::ConditionFailed);
        }
        apply_transition(course, status);
        course.updated_at = Utc::now();
        Ok(course.clone())
    }

    async fn increment_enrollment_count(&self, course_id: &Uuid) -> Result<u64, RepositoryError> {
        let mut courses = self.courses.lock().unwrap();
        let course = courses.get_mut(course_id).ok_or(RepositoryError::NotFound)?;
        course.enrollment_count += 1;
        Ok(course.enrollment_count)
    }

    async fn add_review(
        &self,
        course_id: &Uuid,
        review: &Review,
        rating: f64,
        expected_review_count: u32,
    ) -> Result<Course, RepositoryError> {
        let mut courses = self.courses.lock().unwrap();
        let course = courses.get_mut(course_id).ok_or(RepositoryError::ConditionFailed)?;
        if course.review_count != expected_review_count {
            return Err(RepositoryError::ConditionFailed);
        }
        course.reviews.push(review.clone());
        course.rating = rating;
        course.review_count = expected_review_count + 1;
        course.updated_at = Utc::now();
        Ok(course.clone())
    }

    async fn delete_course(&self, course_id: &Uuid) -> Result<(), RepositoryError> {
        self.courses.lock().unwrap().remove(course_id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryEnrollments {
    enrollments: Mutex<HashMap<(Uuid, Uuid), Enrollment>>,
}

#[async_trait]
impl EnrollmentsRepository for InMemoryEnrollments {
    async fn create_enrollment(&self, enrollment: &Enrollment) -> Result<(), RepositoryError> {
        // Lets concurrent callers interleave between their existence check and the insert.
        tokio::task::yield_now().await;

        let mut enrollments = self.enrollments.lock().unwrap();
        let key = (enrollment.user_id, enrollment.course_id);
        if enrollments.contains_key(&key) {
            return Err(RepositoryError::Duplicate);
        }
        enrollments.insert(key, enrollment.clone());
        Ok(())
    }

    async fn get_enrollment(&self, user_id: &Uuid, course_id: &Uuid) -> Result<Option<Enrollment>, RepositoryError> {
        let enrollments = self.enrollments.lock().unwrap();
        Ok(enrollments.get(&(*user_id, *course_id)).cloned())
    }

    async fn list_enrollments_by_user(&self, user_id: &Uuid) -> Result<Vec<Enrollment>, RepositoryError> {
        let enrollments = self.enrollments.lock().unwrap();
        Ok(enrollments.values().filter(|e| &e.user_id == user_id).cloned().collect())
    }

    async fn list_enrollments_by_course(&self, course_id: &Uuid) -> Result<Vec<Enrollment>, RepositoryError> {
        let enrollments = self.enrollments.lock().unwrap();
        Ok(enrollments
            .values()
            .filter(|e| &e.course_id == course_id)
            .cloned()
            .collect())
    }
}

/// Object store keeping bodies in memory. Clones share their objects.
#[derive(Clone, Default)]
pub(crate) struct FakeObjectStore {
    objects: Arc<Mutex<BTreeMap<String, (String, Vec<u8>)>>>,
}

impl FakeObjectStore {
    /// Stored keys with their content types.
    pub fn objects(&self) -> Vec<(String, String)> {
        let objects = self.objects.lock().unwrap();
        objects.iter().map(|(k, (ct, _))| (k.clone(), ct.clone())).collect()
    }

    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).map(|(_, body)| body.clone())
    }
}

#[async_trait]
impl PutObject for FakeObjectStore {
    async fn put_object(&self, input: PutObjectInput) -> Result<(), ObjectStoreError> {
        let body = std::fs::read(&input.body_path).map_err(|e| ObjectStoreError::Body(Box::new(e)))?;
        self.objects
            .lock()
            .unwrap()
            .insert(input.key, (input.content_type, body));
        Ok(())
    }
}

#[async_trait]
impl PresignGetObject for FakeObjectStore {
    async fn presign_get_object(&self, input: PresignGetObjectInput) -> Result<String, ObjectStoreError> {
        Ok(format!(
            "https://signed.example/{}?X-Amz-Expires={}",
            input.key,
            input.expires_in.as_secs()
        ))
    }
}

#[async_trait]
impl DeleteObject for FakeObjectStore {
    async fn delete_object(&self, input: DeleteObjectInput) -> Result<(), ObjectStoreError> {
        self.objects.lock().unwrap().remove(&input.key);
        Ok(())
    }
}

/// Delegates to a real store and can be told to fail after a number of successful uploads.
pub(crate) struct FlakyMediaStore {
    inner: Box<dyn MediaStore>,
    uploads_left: Mutex<Option<usize>>,
}

#[async_trait]
impl MediaStore for FlakyMediaStore {
    async fn store(&self, owner_id: &Uuid, staged: StagedFile) -> Result<String, MediaStoreError> {
        {
            let mut left = self.uploads_left.lock().unwrap();
            match *left {
                Some(0) => return Err(io::Error::new(io::ErrorKind::Other, "upload refused").into()),
                Some(ref mut n) => *n -= 1,
                None => {}
            }
        }
        self.inner.store(owner_id, staged).await
    }

    async fn resolve(&self, reference: &str) -> Result<ResolvedMedia, MediaStoreError> {
        self.inner.resolve(reference).await
    }

    async fn remove(&self, reference: &str) -> Result<(), MediaStoreError> {
        self.inner.remove(reference).await
    }

    fn staging_dir(&self) -> &Path {
        self.inner.staging_dir()
    }
}

pub(crate) fn test_settings(upload_dir: &Path, object_storage: Option<ObjectStorageSettings>) -> Settings {
    Settings {
        jwt_secret: "test-secret".to_string(),
        users_table_name: "Users".to_string(),
        courses_table_name: "Courses".to_string(),
        enrollments_table_name: "Enrollments".to_string(),
        dynamodb_endpoint: None,
        object_storage,
        payments_enabled: false,
        upload_dir: upload_dir.to_path_buf(),
        public_base_url: "http://localhost:5000".to_string(),
        bind_address: "127.0.0.1:0".to_string(),
    }
}

fn password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TestContext::PASSWORD).unwrap())
}

/// A context over in-memory repositories and a media store rooted in a temporary directory.
pub(crate) struct TestContext {
    pub ctx: Context,
    media: Arc<FlakyMediaStore>,
    objects: Option<FakeObjectStore>,
    started: DateTime<Utc>,
    seq: AtomicI64,
    upload_dir: PathBuf,
    _dir: TempDir,
}

impl TestContext {
    pub const PASSWORD: &'static str = "password1";

    /// Media kept on local disk.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Media kept in a fake object store.
    pub fn with_object_store() -> Self {
        Self::build(true)
    }

    fn build(object_store: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let upload_dir = dir.path().to_path_buf();
        let storage = ObjectStorageSettings {
            bucket: BUCKET.to_string(),
            region: REGION.to_string(),
        };

        let (inner, objects, object_storage): (Box<dyn MediaStore>, _, _) = if object_store {
            let objects = FakeObjectStore::default();
            let store = S3MediaStore::new(objects.clone(), storage.clone(), &upload_dir, "http://localhost:5000");
            (Box::new(store), Some(objects), Some(storage))
        } else {
            (Box::new(LocalMediaStore::new(&upload_dir, "http://localhost:5000")), None, None)
        };
        std::fs::create_dir_all(inner.staging_dir()).unwrap();
        let media = Arc::new(FlakyMediaStore {
            inner,
            uploads_left: Mutex::new(None),
        });

        let ctx = Context {
            settings: test_settings(&upload_dir, object_storage),
            users: Arc::new(InMemoryUsers::default()),
            courses: Arc::new(InMemoryCourses::default()),
            enrollments: Arc::new(InMemoryEnrollments::default()),
            media: media.clone(),
        };

        TestContext {
            ctx,
            media,
            objects,
            started: Utc::now(),
            seq: AtomicI64::new(0),
            upload_dir,
            _dir: dir,
        }
    }

    /// Strictly increasing timestamps, so that "newest first" orderings are deterministic.
    fn next_time(&self) -> (i64, DateTime<Utc>) {
        let n = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        (n, self.started + Duration::seconds(n))
    }

    pub fn caller(user: &UserAccount) -> Caller {
        Caller {
            user_id: user.user_id,
            role: user.role,
        }
    }

    pub async fn add_user(&self, name: &str, role: crate::user_account::Role) -> UserAccount {
        let (n, created_at) = self.next_time();
        let first_name = name.split_whitespace().next().unwrap_or("user").to_lowercase();
        let user = UserAccount::builder()
            .name(name)
            .email(format!("{}.{}@example.com", first_name, n))
            .password(password_hash())
            .role(role)
            .created_at(created_at)
            .build();
        self.ctx.users.create_user(&user).await.unwrap();
        user
    }

    fn asset_references(&self, n: i64) -> (String, String) {
        match self.objects {
            Some(_) => (
                object_url(BUCKET, REGION, &format!("courses/videos/seed-{n}.mp4")),
                object_url(BUCKET, REGION, &format!("courses/thumbnails/seed-{n}.png")),
            ),
            None => (format!("/uploads/video-seed-{n}.mp4"), format!("/uploads/thumbnail-seed-{n}.png")),
        }
    }

    /// Stores a course in `status`. Only the legacy flag follows the status; the asset guards are
    /// not checked.
    pub async fn add_course(&self, instructor: &UserAccount, status: CourseStatus, with_assets: bool) -> Course {
        let (n, created_at) = self.next_time();
        let (video, thumbnail) = if with_assets {
            self.asset_references(n)
        } else {
            (String::new(), String::new())
        };
        let course = Course::builder()
            .title(format!("Course {n}"))
            .description("A course for tests")
            .language("English")
            .price(10.0 + n as f64)
            .instructor_id(instructor.user_id)
            .video_url(video)
            .thumbnail(thumbnail)
            .status(Some(status))
            .is_published(published_flag(status).unwrap_or(true))
            .created_at(created_at)
            .updated_at(created_at)
            .build();
        self.ctx.courses.create_course(&course).await.unwrap();
        course
    }

    /// Stores a course written before statuses existed, with both assets.
    pub async fn add_legacy_course(&self, instructor: &UserAccount, published: bool) -> Course {
        let mut course = self.add_course(instructor, CourseStatus::Draft, true).await;
        course.status = None;
        course.is_published = published;
        self.ctx.courses.delete_course(&course.course_id).await.unwrap();
        self.ctx.courses.create_course(&course).await.unwrap();
        course
    }

    /// Enrolls the student with a completed payment, the way a successful enrollment leaves things.
    pub async fn add_enrollment(&self, student: &UserAccount, course: &Course) -> Enrollment {
        let (_, enrolled_at) = self.next_time();
        let enrollment = Enrollment::builder()
            .user_id(student.user_id)
            .course_id(course.course_id)
            .enrolled_at(enrolled_at)
            .payment_status(PaymentStatus::Completed)
            .amount(course.price)
            .created_at(enrolled_at)
            .build();
        self.ctx.enrollments.create_enrollment(&enrollment).await.unwrap();
        self.ctx
            .courses
            .increment_enrollment_count(&course.course_id)
            .await
            .unwrap();
        enrollment
    }

    /// References of every stored file: files in the upload directory and objects in the store.
    pub fn stored_media(&self) -> Vec<String> {
        let mut references: Vec<String> = std::fs::read_dir(&self.upload_dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .map(|entry| format!("/uploads/{}", entry.file_name().to_string_lossy()))
            .collect();
        if let Some(objects) = &self.objects {
            references.extend(
                objects
                    .objects()
                    .into_iter()
                    .map(|(key, _)| object_url(BUCKET, REGION, &key)),
            );
        }
        references.sort();
        references
    }

    pub fn fail_media_store_after(&self, uploads: usize) {
        *self.media.uploads_left.lock().unwrap() = Some(uploads);
    }
}

/// A finished upload of a few bytes, staged where the context's media store expects it.
pub(crate) async fn staged_file(ctx: &Context, kind: AssetKind, file_name: &str) -> StagedFile {
    let mut staged = StagedFile::create(ctx.media.staging_dir(), kind, file_name).unwrap();
    staged.write_chunk(b"test media").await.unwrap();
    staged.finish().await.unwrap();
    staged
}
