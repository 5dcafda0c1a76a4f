use serde::{Deserialize, Serialize};

use crate::directory::PersonId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher,
    Student,
}

/// A resolved caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub role: Role,
    pub id: PersonId,
}

impl Principal {
    pub fn teacher(id: PersonId) -> Self { Self { role: Role::Teacher, id } }
    pub fn student(id: PersonId) -> Self { Self { role: Role::Student, id } }
}
