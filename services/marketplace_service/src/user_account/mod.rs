pub mod ddb_repository;
pub mod password;
pub mod repository;
pub mod types;

pub use password::{hash_password, verify_password, PasswordError};
pub use repository::{ProfileUpdate, UserLookup, UsersRepository};
pub use types::{AccountProfile, Role, UserAccount};
