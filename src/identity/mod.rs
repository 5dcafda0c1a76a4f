//! Identity for the gradebook: token resolution, login and course-level authorization.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod authorizer;

pub use principal::{Principal, Role};
pub use session::{DigestKind, Md5Digest, SessionResolver, SessionToken, Sha256Digest, TokenDigest};
pub use provider::{AuthProvider, DirectoryAuthProvider, LoginRequest, LoginResponse};
pub use authorizer::{require_student_follows_course, require_teacher_can_grade, require_teacher_owns_course};
