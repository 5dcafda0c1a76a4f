use std::sync::Arc;

use tracing::{debug, info};

use super::principal::Principal;
use super::session::{SessionResolver, SessionToken};
use crate::directory::Directory;
use crate::error::{SchoolError, SchoolResult};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub token: SessionToken,
    pub principal: Principal,
}

pub trait AuthProvider: Send + Sync {
    fn login(&self, req: &LoginRequest) -> SchoolResult<LoginResponse>;
}

/// Checks credentials against the directory and hands out the email digest as token.
pub struct DirectoryAuthProvider {
    pub directory: Arc<Directory>,
    pub resolver: Arc<SessionResolver>,
}

impl DirectoryAuthProvider {
    pub fn new(directory: Arc<Directory>, resolver: Arc<SessionResolver>) -> Self {
        Self { directory, resolver }
    }
}

impl AuthProvider for DirectoryAuthProvider {
    fn login(&self, req: &LoginRequest) -> SchoolResult<LoginResponse> {
        // Teachers are matched first; an email present in both tables logs in as teacher.
        let principal = match self.directory.find_teacher_by_email(&req.email) {
            Ok(t) if t.password == req.password => Principal::teacher(t.id),
            _ => match self.directory.find_student_by_email(&req.email) {
                Ok(s) if s.password == req.password => Principal::student(s.id),
                _ => {
                    debug!(target: "gradebook::auth", email = %req.email, "login rejected");
                    return Err(SchoolError::CredentialsNotMatched);
                }
            },
        };
        let token = self.resolver.issue(&req.email);
        info!(target: "gradebook::auth", role = ?principal.role, id = principal.id, "login");
        Ok(LoginResponse { token, principal })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::session::{DigestKind, Md5Digest, TokenDigest};

    fn provider() -> DirectoryAuthProvider {
        let d = Arc::new(Directory::seed());
        let r = Arc::new(SessionResolver::new(&d, DigestKind::Md5.build()));
        DirectoryAuthProvider::new(d, r)
    }

    fn req(email: &str, password: &str) -> LoginRequest {
        LoginRequest { email: email.into(), password: password.into() }
    }

    #[test]
    fn teacher_and_student_login() {
        let p = provider();
        let t = p.login(&req("teacher+3@gmail.com", "1234")).unwrap();
        assert_eq!(t.principal, Principal::teacher(3));
        assert_eq!(t.token, Md5Digest.digest("teacher+3@gmail.com"));
        let s = p.login(&req("student+3@gmail.com", "1234")).unwrap();
        assert_eq!(s.principal, Principal::student(3));
    }

    #[test]
    fn bad_credentials() {
        let p = provider();
        assert_eq!(p.login(&req("invalid+3@gmail.com", "1234")).unwrap_err(), SchoolError::CredentialsNotMatched);
        assert_eq!(p.login(&req("teacher+3@gmail.com", "nope")).unwrap_err(), SchoolError::CredentialsNotMatched);
        assert_eq!(p.login(&req("", "")).unwrap_err(), SchoolError::CredentialsNotMatched);
    }
}
