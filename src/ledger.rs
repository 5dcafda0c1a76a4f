//!
//! gradebook ledger
//! ----------------
//! In-memory store of grade records. Records are appended and never updated in place:
//! several entries for the same (student, course, type, type_id) accumulate. Reads return
//! records in insertion order; callers wanting another order sort themselves.
//!
//! The ledger itself is a plain `Vec`; it is normally used through the thread-safe
//! `SharedLedger` (`Arc<RwLock<Ledger>>`) held in the server state.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::directory::{CourseId, PersonId};

/// One scored entry for a student in a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub student: PersonId,
    pub course: CourseId,
    /// Free-form category such as "devoir" or "questionnaire".
    #[serde(rename = "type")]
    pub kind: String,
    /// Distinguishes several gradable items of the same type.
    pub type_id: i64,
    pub note: f64,
}

/// A record as seen by the student it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentNote {
    pub course: CourseId,
    #[serde(rename = "type")]
    pub kind: String,
    pub type_id: i64,
    pub note: f64,
}

/// A record as seen from a course roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseNote {
    pub course: CourseId,
    pub student: PersonId,
    #[serde(rename = "type")]
    pub kind: String,
    pub type_id: i64,
    pub note: f64,
}

impl From<&GradeRecord> for StudentNote {
    fn from(r: &GradeRecord) -> Self {
        Self { course: r.course, kind: r.kind.clone(), type_id: r.type_id, note: r.note }
    }
}

impl From<&GradeRecord> for CourseNote {
    fn from(r: &GradeRecord) -> Self {
        Self { course: r.course, student: r.student, kind: r.kind.clone(), type_id: r.type_id, note: r.note }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<GradeRecord>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, record: GradeRecord) {
        self.records.push(record);
    }

    pub fn by_student(&self, student_id: PersonId) -> Vec<StudentNote> {
        self.records.iter().filter(|r| r.student == student_id).map(StudentNote::from).collect()
    }

    pub fn by_course(&self, course_id: CourseId) -> Vec<CourseNote> {
        self.records.iter().filter(|r| r.course == course_id).map(CourseNote::from).collect()
    }

    /// Drop every record. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let n = self.records.len();
        self.records.clear();
        n
    }

    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

/// Shared handle to a ledger. Writers (insert, clear) hold the lock exclusively, so a
/// reader never observes a partially cleared ledger.
#[derive(Clone, Default)]
pub struct SharedLedger(pub Arc<RwLock<Ledger>>);

impl SharedLedger {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, record: GradeRecord) {
        debug!(target: "gradebook::ledger", student = record.student, course = record.course, kind = %record.kind, type_id = record.type_id, "insert");
        self.0.write().insert(record);
    }

    pub fn by_student(&self, student_id: PersonId) -> Vec<StudentNote> {
        self.0.read().by_student(student_id)
    }

    pub fn by_course(&self, course_id: CourseId) -> Vec<CourseNote> {
        self.0.read().by_course(course_id)
    }

    pub fn clear_all(&self) -> usize {
        let removed = self.0.write().clear_all();
        info!(target: "gradebook::ledger", removed, "ledger cleared");
        removed
    }

    pub fn len(&self) -> usize { self.0.read().len() }
    pub fn is_empty(&self) -> bool { self.0.read().is_empty() }
}
