use thiserror::Error;

use crate::ids::CourseId;

/// Failure modes of an enrollment attempt.
///
/// Everything else (double-enroll, withdrawing a course the user does not
/// hold) is a successful no-op so the surface stays idempotent and safe to
/// retry after transient transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrollError {
    /// The course is already at its enrollment cap. State is unchanged; the
    /// caller should surface a "course full" outcome.
    #[error("course {course} is full (capacity {capacity})")]
    CapacityExceeded { course: CourseId, capacity: u32 },

    /// The course id did not resolve in the catalog. A request error, not a
    /// ledger invariant violation.
    #[error("course {course} does not exist")]
    UnknownCourse { course: CourseId },
}
