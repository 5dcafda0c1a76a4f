use std::collections::HashMap;
use std::sync::Arc;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::directory::{Directory, PersonId};
use crate::error::{SchoolError, SchoolResult};

pub type SessionToken = String;

/// One-way function turning an email into the bearer token presented by clients.
/// Identification only; the output is not a secret.
pub trait TokenDigest: Send + Sync {
    fn name(&self) -> &'static str;
    fn digest(&self, email: &str) -> SessionToken;
}

/// Lowercase hex MD5. Clients of the original service compute exactly this.
#[derive(Debug, Default, Clone, Copy)]
pub struct Md5Digest;

impl TokenDigest for Md5Digest {
    fn name(&self) -> &'static str { "md5" }
    fn digest(&self, email: &str) -> SessionToken {
        hex::encode(Md5::digest(email.as_bytes()))
    }
}

/// Lowercase hex SHA-256.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Digest;

impl TokenDigest for Sha256Digest {
    fn name(&self) -> &'static str { "sha256" }
    fn digest(&self, email: &str) -> SessionToken {
        hex::encode(Sha256::digest(email.as_bytes()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DigestKind {
    #[default]
    Md5,
    Sha256,
}

impl DigestKind {
    pub fn build(self) -> Arc<dyn TokenDigest> {
        match self {
            DigestKind::Md5 => Arc::new(Md5Digest),
            DigestKind::Sha256 => Arc::new(Sha256Digest),
        }
    }
}

/// Maps tokens back to the teacher or student they were derived from.
///
/// Digests are computed once per person at construction; resolution is a map lookup.
/// Collisions between two emails are not defended against.
pub struct SessionResolver {
    digest: Arc<dyn TokenDigest>,
    teachers: HashMap<SessionToken, PersonId>,
    students: HashMap<SessionToken, PersonId>,
}

impl SessionResolver {
    pub fn new(directory: &Directory, digest: Arc<dyn TokenDigest>) -> Self {
        let mut teachers = HashMap::new();
        for p in directory.teachers() {
            if let Some(prev) = teachers.insert(digest.digest(&p.email), p.id) {
                warn!(target: "gradebook::auth", "teacher token collision between ids {} and {}", prev, p.id);
            }
        }
        let mut students = HashMap::new();
        for p in directory.students() {
            if let Some(prev) = students.insert(digest.digest(&p.email), p.id) {
                warn!(target: "gradebook::auth", "student token collision between ids {} and {}", prev, p.id);
            }
        }
        debug!(target: "gradebook::auth", digest = digest.name(), teachers = teachers.len(), students = students.len(), "session resolver ready");
        Self { digest, teachers, students }
    }

    /// Token a client must present for the given email.
    pub fn issue(&self, email: &str) -> SessionToken {
        self.digest.digest(email)
    }

    pub fn digest_name(&self) -> &'static str { self.digest.name() }

    pub fn resolve_teacher(&self, token: &str) -> SchoolResult<PersonId> {
        self.teachers.get(token).copied().ok_or(SchoolError::TeacherTokenNotFound)
    }

    pub fn resolve_student(&self, token: &str) -> SchoolResult<PersonId> {
        self.students.get(token).copied().ok_or(SchoolError::StudentTokenNotFound)
    }
}
