//! Ownership and enrollment checks over directory data. Stateless: every check is a
//! relation lookup that either passes silently or returns the role-specific error.
//! An unknown course fails the same way as a course the caller has no relation to.

use tracing::debug;

use crate::directory::{CourseId, Directory, PersonId};
use crate::error::{SchoolError, SchoolResult};

pub fn require_teacher_owns_course(directory: &Directory, teacher_id: PersonId, course_id: CourseId) -> SchoolResult<()> {
    match directory.course(course_id) {
        Some(c) if c.is_taught_by(teacher_id) => Ok(()),
        _ => {
            debug!(target: "gradebook::auth", teacher = teacher_id, course = course_id, "ownership denied");
            Err(SchoolError::TeacherDoesNotTeachCourse)
        }
    }
}

pub fn require_student_follows_course(directory: &Directory, student_id: PersonId, course_id: CourseId) -> SchoolResult<()> {
    match directory.course(course_id) {
        Some(c) if c.is_followed_by(student_id) => Ok(()),
        _ => {
            debug!(target: "gradebook::auth", student = student_id, course = course_id, "enrollment denied");
            Err(SchoolError::StudentNotEnrolledInCourse)
        }
    }
}

/// Gate for a teacher writing a grade: ownership first, then enrollment.
pub fn require_teacher_can_grade(
    directory: &Directory,
    teacher_id: PersonId,
    student_id: PersonId,
    course_id: CourseId,
) -> SchoolResult<()> {
    require_teacher_owns_course(directory, teacher_id, course_id)?;
    require_student_follows_course(directory, student_id, course_id)
}
