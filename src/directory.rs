//!
//! gradebook directory
//! -------------------
//! Read-only reference data: teachers, students and courses, with the teaching
//! assignment (one teacher per course) and enrollment (many students per course)
//! relations. The directory is built once at startup, either from the built-in seed
//! or from a JSON document, and is shared immutably afterwards.
//!
//! All listings are returned in ascending id order.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SchoolError, SchoolResult};

pub type PersonId = u32;
pub type CourseId = u32;

/// A teacher or a student. The role is given by which table of the directory holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Login secret, compared verbatim. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub title: String,
    /// Id of the teacher who gives the course.
    pub teacher: PersonId,
    /// Enrollment set. Internal; not part of the course's public shape.
    #[serde(default, skip_serializing)]
    pub students: BTreeSet<PersonId>,
}

impl Course {
    pub fn is_taught_by(&self, teacher_id: PersonId) -> bool {
        self.teacher == teacher_id
    }

    pub fn is_followed_by(&self, student_id: PersonId) -> bool {
        self.students.contains(&student_id)
    }
}

/// On-disk shape of a directory document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryFile {
    #[serde(default)]
    pub teachers: Vec<Person>,
    #[serde(default)]
    pub students: Vec<Person>,
    #[serde(default)]
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone)]
pub struct Directory {
    teachers: BTreeMap<PersonId, Person>,
    students: BTreeMap<PersonId, Person>,
    courses: BTreeMap<CourseId, Course>,
}

fn index_people(role: &str, people: Vec<Person>) -> Result<BTreeMap<PersonId, Person>> {
    let mut emails: HashSet<String> = HashSet::new();
    let mut out = BTreeMap::new();
    for p in people {
        if !emails.insert(p.email.clone()) {
            bail!("duplicate {} email '{}'", role, p.email);
        }
        let id = p.id;
        if out.insert(id, p).is_some() {
            bail!("duplicate {} id {}", role, id);
        }
    }
    Ok(out)
}

impl Directory {
    /// Build a directory from its parts, validating ids, emails and course relations.
    pub fn from_file(file: DirectoryFile) -> Result<Self> {
        let teachers = index_people("teacher", file.teachers)?;
        let students = index_people("student", file.students)?;
        let mut courses = BTreeMap::new();
        for c in file.courses {
            if !teachers.contains_key(&c.teacher) {
                bail!("course {} references unknown teacher {}", c.id, c.teacher);
            }
            if let Some(sid) = c.students.iter().find(|sid| !students.contains_key(sid)) {
                bail!("course {} enrolls unknown student {}", c.id, sid);
            }
            let id = c.id;
            if courses.insert(id, c).is_some() {
                bail!("duplicate course id {}", id);
            }
        }
        Ok(Self { teachers, students, courses })
    }

    /// Load a JSON directory document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read directory file: {}", path.display()))?;
        let file: DirectoryFile = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse directory file: {}", path.display()))?;
        let dir = Self::from_file(file)
            .with_context(|| format!("Invalid directory file: {}", path.display()))?;
        info!(
            target: "gradebook::directory",
            "loaded directory from {}: teachers={}, students={}, courses={}",
            path.display(), dir.teachers.len(), dir.students.len(), dir.courses.len()
        );
        Ok(dir)
    }

    /// Built-in school used when no directory file is configured.
    pub fn seed() -> Self {
        let person = |id: PersonId, role: &str, first: &str, last: &str| Person {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}+{}@gmail.com", role, id),
            password: "1234".to_string(),
        };
        let teachers = vec![
            person(1, "teacher", "Alice", "Tremblay"),
            person(2, "teacher", "Bruno", "Gagnon"),
            person(3, "teacher", "Chloe", "Roy"),
            person(4, "teacher", "Denis", "Cote"),
        ];
        let students = vec![
            person(1, "student", "Emma", "Bouchard"),
            person(2, "student", "Felix", "Gauthier"),
            person(3, "student", "Gabrielle", "Morin"),
            person(4, "student", "Hugo", "Lavoie"),
            person(5, "student", "Ines", "Fortin"),
            person(6, "student", "Jules", "Gagne"),
        ];
        let course = |id: CourseId, code: &str, title: &str, teacher: PersonId, students: &[PersonId]| Course {
            id,
            code: code.to_string(),
            title: title.to_string(),
            teacher,
            students: students.iter().copied().collect(),
        };
        let courses = vec![
            course(1, "LOG121", "Conception orientee objet", 1, &[1, 2]),
            course(2, "LOG210", "Analyse et conception de logiciels", 2, &[1, 4]),
            course(3, "LOG320", "Structures de donnees et algorithmes", 3, &[2, 6]),
            course(4, "LOG430", "Architecture logicielle", 3, &[1, 5]),
            course(5, "LOG530", "Reingenierie du logiciel", 4, &[3, 4]),
            course(6, "LOG710", "Systemes d'exploitation", 4, &[3, 5, 6]),
        ];
        Self {
            teachers: teachers.into_iter().map(|p| (p.id, p)).collect(),
            students: students.into_iter().map(|p| (p.id, p)).collect(),
            courses: courses.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn teachers(&self) -> impl Iterator<Item = &Person> { self.teachers.values() }
    pub fn students(&self) -> impl Iterator<Item = &Person> { self.students.values() }
    pub fn courses(&self) -> impl Iterator<Item = &Course> { self.courses.values() }

    pub fn teacher(&self, id: PersonId) -> Option<&Person> { self.teachers.get(&id) }
    pub fn student(&self, id: PersonId) -> Option<&Person> { self.students.get(&id) }
    pub fn course(&self, id: CourseId) -> Option<&Course> { self.courses.get(&id) }

    /// Exact, case-sensitive email match.
    pub fn find_teacher_by_email(&self, email: &str) -> SchoolResult<&Person> {
        self.teachers.values().find(|p| p.email == email).ok_or(SchoolError::PersonNotFound)
    }

    /// Exact, case-sensitive email match.
    pub fn find_student_by_email(&self, email: &str) -> SchoolResult<&Person> {
        self.students.values().find(|p| p.email == email).ok_or(SchoolError::PersonNotFound)
    }

    pub fn courses_taught_by(&self, teacher_id: PersonId) -> Vec<&Course> {
        self.courses.values().filter(|c| c.is_taught_by(teacher_id)).collect()
    }

    pub fn courses_followed_by(&self, student_id: PersonId) -> Vec<&Course> {
        self.courses.values().filter(|c| c.is_followed_by(student_id)).collect()
    }

    /// Students enrolled in a course.
    pub fn students_of(&self, course_id: CourseId) -> SchoolResult<Vec<&Person>> {
        let course = self.course(course_id).ok_or(SchoolError::CourseNotFound(course_id))?;
        let out: Vec<&Person> = course.students.iter().filter_map(|sid| self.students.get(sid)).collect();
        debug!(target: "gradebook::directory", course = course_id, count = out.len(), "students_of");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<'a>(it: impl IntoIterator<Item = &'a Course>) -> Vec<CourseId> {
        it.into_iter().map(|c| c.id).collect()
    }

    #[test]
    fn seed_relations() {
        let d = Directory::seed();
        assert_eq!(ids(d.courses_taught_by(3)), vec![3, 4]);
        assert_eq!(ids(d.courses_taught_by(1)), vec![1]);
        assert_eq!(ids(d.courses_followed_by(3)), vec![5, 6]);
        assert!(d.courses_taught_by(99).is_empty());
        assert!(d.courses_followed_by(99).is_empty());
    }

    #[test]
    fn students_of_is_stable_across_calls() {
        let d = Directory::seed();
        let first: Vec<PersonId> = d.students_of(3).unwrap().iter().map(|p| p.id).collect();
        let _ = d.students_of(6).unwrap();
        let second: Vec<PersonId> = d.students_of(3).unwrap().iter().map(|p| p.id).collect();
        assert_eq!(first, vec![2, 6]);
        assert_eq!(first, second);
        for c in d.courses() {
            let got: BTreeSet<PersonId> = d.students_of(c.id).unwrap().iter().map(|p| p.id).collect();
            assert_eq!(got, c.students);
        }
    }

    #[test]
    fn students_of_unknown_course() {
        let d = Directory::seed();
        assert_eq!(d.students_of(42).unwrap_err(), SchoolError::CourseNotFound(42));
    }

    #[test]
    fn email_lookup_is_exact() {
        let d = Directory::seed();
        assert_eq!(d.find_teacher_by_email("teacher+3@gmail.com").unwrap().id, 3);
        assert_eq!(d.find_student_by_email("student+3@gmail.com").unwrap().id, 3);
        assert_eq!(d.find_teacher_by_email("Teacher+3@gmail.com").unwrap_err(), SchoolError::PersonNotFound);
        assert!(d.find_student_by_email("teacher+3@gmail.com").is_err());
    }

    #[test]
    fn serialized_shapes_hide_internals() {
        let d = Directory::seed();
        let c = serde_json::to_value(d.course(1).unwrap()).unwrap();
        assert_eq!(c["teacher"], 1);
        assert!(c.get("students").is_none());
        let p = serde_json::to_value(d.student(1).unwrap()).unwrap();
        assert_eq!(p["email"], "student+1@gmail.com");
        assert!(p.get("password").is_none());
    }

    #[test]
    fn from_file_rejects_dangling_relations() {
        let teacher = Person { id: 1, first_name: "A".into(), last_name: "B".into(), email: "a@x".into(), password: "p".into() };
        let course = Course { id: 1, code: "C1".into(), title: "T".into(), teacher: 2, students: BTreeSet::new() };
        let err = Directory::from_file(DirectoryFile { teachers: vec![teacher.clone()], students: vec![], courses: vec![course] }).unwrap_err();
        assert!(err.to_string().contains("unknown teacher"), "{err}");

        let course = Course { id: 1, code: "C1".into(), title: "T".into(), teacher: 1, students: [7].into_iter().collect() };
        let err = Directory::from_file(DirectoryFile { teachers: vec![teacher.clone()], students: vec![], courses: vec![course] }).unwrap_err();
        assert!(err.to_string().contains("unknown student"), "{err}");

        let dup = Person { id: 2, ..teacher.clone() };
        let err = Directory::from_file(DirectoryFile { teachers: vec![teacher, dup], students: vec![], courses: vec![] }).unwrap_err();
        assert!(err.to_string().contains("duplicate teacher email"), "{err}");
    }

    #[test]
    fn load_from_json_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("school.json");
        let doc = serde_json::json!({
            "teachers": [{"id": 10, "first_name": "T", "last_name": "X", "email": "t@school", "password": "pw"}],
            "students": [{"id": 20, "first_name": "S", "last_name": "Y", "email": "s@school", "password": "pw"}],
            "courses": [{"id": 30, "code": "C30", "title": "Thirty", "teacher": 10, "students": [20]}]
        });
        std::fs::write(&path, doc.to_string()).unwrap();
        let d = Directory::load(&path).unwrap();
        assert_eq!(d.find_teacher_by_email("t@school").unwrap().password, "pw");
        assert_eq!(ids(d.courses_followed_by(20)), vec![30]);
        assert!(Directory::load(tmp.path().join("missing.json")).is_err());
    }
}
