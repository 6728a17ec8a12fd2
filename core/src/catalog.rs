//! Course catalog: the collaborator the ledger reads capacity from.
//!
//! The ledger never caches capacity; the registrar resolves it through
//! [`Catalog`] on every enrollment attempt, so catalog edits take effect on
//! the next attempt without touching existing enrollments.

use std::collections::BTreeMap;

use rollcall_types::CourseId;
use tracing::debug;

/// Fallback capacity applied when a course record carries no explicit cap.
///
/// A catalog policy, not a ledger constant: callers that want a different
/// default construct their catalog with [`CourseCatalog::with_default_capacity`].
pub const DEFAULT_CAPACITY: u32 = 5;

/// Read surface the registrar needs from a course catalog.
pub trait Catalog {
    /// Authoritative capacity for `course`, or `None` if the course does not
    /// exist.
    fn capacity(&self, course: CourseId) -> Option<u32>;

    /// Whether `course` exists in the catalog.
    fn exists(&self, course: CourseId) -> bool {
        self.capacity(course).is_some()
    }
}

/// A course record.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    /// Section or class label, e.g. "CS-1A".
    pub section: String,
    /// Meeting days, e.g. `["Mon", "Wed"]`.
    pub days: Vec<String>,
    /// Pinned courses are seeded by the institution and cannot be edited or
    /// removed through the catalog's mutation surface.
    #[serde(default)]
    pub pinned: bool,
    /// Explicit enrollment cap; `None` falls back to the catalog default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// In-memory course catalog with a mutation surface for user-created courses.
#[derive(Debug, Clone)]
pub struct CourseCatalog {
    courses: BTreeMap<CourseId, Course>,
    default_capacity: u32,
}

impl CourseCatalog {
    /// An empty catalog with the standard default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_capacity(DEFAULT_CAPACITY)
    }

    /// An empty catalog whose capacity fallback is `default_capacity`.
    #[must_use]
    pub fn with_default_capacity(default_capacity: u32) -> Self {
        Self {
            courses: BTreeMap::new(),
            default_capacity,
        }
    }

    /// The institution-seeded catalog the application starts from.
    #[must_use]
    pub fn seeded() -> Self {
        let mut catalog = Self::new();
        for course in [
            Course {
                id: CourseId::new(101),
                name: "Advanced Calculus".to_string(),
                section: "Math-1A".to_string(),
                days: vec!["Mon".to_string(), "Wed".to_string()],
                pinned: true,
                capacity: None,
            },
            Course {
                id: CourseId::new(102),
                name: "Introduction to Artificial Intelligence".to_string(),
                section: "CS-3B".to_string(),
                days: vec!["Tue".to_string()],
                pinned: true,
                capacity: None,
            },
            Course {
                id: CourseId::new(103),
                name: "Physical Education".to_string(),
                section: "PE".to_string(),
                days: vec!["Fri".to_string()],
                pinned: true,
                capacity: None,
            },
        ] {
            catalog.courses.insert(course.id, course);
        }
        catalog
    }

    /// Add a user-created (unpinned) course, allocating the next id above the
    /// current maximum. Returns the new id.
    pub fn add_course(
        &mut self,
        name: impl Into<String>,
        section: impl Into<String>,
        days: Vec<String>,
    ) -> CourseId {
        let id = self
            .courses
            .keys()
            .next_back()
            .map_or(CourseId::new(100), |max| CourseId::new(max.value() + 1));
        let course = Course {
            id,
            name: name.into(),
            section: section.into(),
            days,
            pinned: false,
            capacity: None,
        };
        debug!(course = %id, name = %course.name, "course added");
        self.courses.insert(id, course);
        id
    }

    /// Rename a course and replace its meeting days. Pinned courses refuse
    /// edits; returns whether the update applied.
    pub fn update_course(&mut self, id: CourseId, name: impl Into<String>, days: Vec<String>) -> bool {
        match self.courses.get_mut(&id) {
            Some(course) if !course.pinned => {
                course.name = name.into();
                course.days = days;
                true
            }
            _ => false,
        }
    }

    /// Remove a user-created course. Pinned courses survive; returns whether
    /// anything was removed.
    pub fn remove_course(&mut self, id: CourseId) -> bool {
        match self.courses.get(&id) {
            Some(course) if !course.pinned => {
                self.courses.remove(&id);
                debug!(course = %id, "course removed");
                true
            }
            _ => false,
        }
    }

    /// Set or clear a course's explicit capacity. Applies to pinned courses
    /// too; takes effect on the next enrollment attempt. Returns whether the
    /// course exists.
    pub fn set_capacity(&mut self, id: CourseId, capacity: Option<u32>) -> bool {
        match self.courses.get_mut(&id) {
            Some(course) => {
                course.capacity = capacity;
                true
            }
            None => false,
        }
    }

    /// Look up a course record.
    #[must_use]
    pub fn course(&self, id: CourseId) -> Option<&Course> {
        self.courses.get(&id)
    }

    /// All courses in id order.
    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }
}

impl Default for CourseCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for CourseCatalog {
    fn capacity(&self, course: CourseId) -> Option<u32> {
        self.courses
            .get(&course)
            .map(|c| c.capacity.unwrap_or(self.default_capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_catalog_has_pinned_defaults() {
        let catalog = CourseCatalog::seeded();
        assert_eq!(catalog.courses().count(), 3);
        assert!(catalog.courses().all(|c| c.pinned));
        assert!(catalog.exists(CourseId::new(101)));
        assert!(!catalog.exists(CourseId::new(999)));
    }

    #[test]
    fn capacity_falls_back_to_catalog_default() {
        let catalog = CourseCatalog::seeded();
        assert_eq!(catalog.capacity(CourseId::new(101)), Some(DEFAULT_CAPACITY));

        let mut catalog = CourseCatalog::with_default_capacity(30);
        let id = catalog.add_course("Linear Algebra", "Math-2A", vec!["Thu".to_string()]);
        assert_eq!(catalog.capacity(id), Some(30));

        assert!(catalog.set_capacity(id, Some(12)));
        assert_eq!(catalog.capacity(id), Some(12));
        assert!(catalog.set_capacity(id, None));
        assert_eq!(catalog.capacity(id), Some(30));
    }

    #[test]
    fn add_course_allocates_past_the_max_id() {
        let mut catalog = CourseCatalog::seeded();
        let id = catalog.add_course("Discrete Math", "Math-1B", vec![]);
        assert_eq!(id, CourseId::new(104));

        let mut empty = CourseCatalog::new();
        assert_eq!(
            empty.add_course("First", "A", vec![]),
            CourseId::new(100)
        );
    }

    #[test]
    fn pinned_courses_refuse_edit_and_removal() {
        let mut catalog = CourseCatalog::seeded();
        assert!(!catalog.remove_course(CourseId::new(101)));
        assert!(!catalog.update_course(CourseId::new(101), "Renamed", vec![]));
        assert!(catalog.exists(CourseId::new(101)));

        let id = catalog.add_course("Web Development", "CS-2A", vec![]);
        assert!(catalog.update_course(id, "Web Dev II", vec!["Fri".to_string()]));
        assert_eq!(catalog.course(id).map(|c| c.name.as_str()), Some("Web Dev II"));
        assert!(catalog.remove_course(id));
        assert!(!catalog.exists(id));
    }

    #[test]
    fn capacity_change_applies_to_pinned_courses() {
        let mut catalog = CourseCatalog::seeded();
        assert!(catalog.set_capacity(CourseId::new(101), Some(0)));
        assert_eq!(catalog.capacity(CourseId::new(101)), Some(0));
    }
}
