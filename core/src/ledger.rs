//! The registration ledger: who holds which courses.
//!
//! The ledger owns the user→courses mapping and enforces per-course capacity
//! at the moment of enrollment. Capacity itself is catalog data, supplied by
//! the caller on every attempt and never cached here, so a capacity change
//! takes effect on the next enrollment without any ledger migration.
//!
//! # Concurrency
//!
//! `enroll` is a check-then-act sequence: read the current count, compare
//! against capacity, append. Two concurrent attempts on the same course that
//! each observe `count < capacity` would jointly overshoot the cap, so the
//! whole sequence runs under one write lock. A single `RwLock` guards the
//! entire ledger; per-course striping buys nothing at this scale and reads
//! (`current_enrollment`, `enrollments_for`, `snapshot`) share a read guard
//! so they never observe torn state.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::RwLock;

use rollcall_types::{CourseId, EnrollError, EnrollOutcome, UserId, WithdrawOutcome};
use tracing::debug;

/// Serializable snapshot of ledger state: user → held course ids.
///
/// Ordered maps keep the on-disk JSON deterministic; course order within a
/// user's set carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LedgerSnapshot(pub BTreeMap<UserId, BTreeSet<CourseId>>);

#[derive(Debug, Default)]
struct LedgerState {
    /// Primary mapping: the courses each user currently holds.
    holdings: HashMap<UserId, BTreeSet<CourseId>>,
    /// Reverse index kept in lockstep, so counting holders is O(1).
    rosters: HashMap<CourseId, HashSet<UserId>>,
}

impl LedgerState {
    fn insert(&mut self, user: &UserId, course: CourseId) {
        self.holdings
            .entry(user.clone())
            .or_default()
            .insert(course);
        self.rosters.entry(course).or_default().insert(user.clone());
    }

    fn remove(&mut self, user: &UserId, course: CourseId) -> bool {
        let removed = match self.holdings.get_mut(user) {
            Some(courses) => courses.remove(&course),
            None => false,
        };
        if removed {
            if let Some(holders) = self.rosters.get_mut(&course) {
                holders.remove(user);
                if holders.is_empty() {
                    self.rosters.remove(&course);
                }
            }
            if self.holdings.get(user).is_some_and(BTreeSet::is_empty) {
                self.holdings.remove(user);
            }
        }
        removed
    }

    fn holder_count(&self, course: CourseId) -> usize {
        self.rosters.get(&course).map_or(0, HashSet::len)
    }
}

/// Thread-safe registration ledger.
///
/// Created empty (or restored from a [`LedgerSnapshot`]) at process start and
/// owned by the request-handling layer; every mutation either fully succeeds
/// with the capacity invariant intact or is rejected leaving state unchanged.
#[derive(Debug, Default)]
pub struct Ledger {
    state: RwLock<LedgerState>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from a persisted snapshot.
    ///
    /// Duplicate course ids within a user collapse (a user holds at most one
    /// entry per course). Capacity is not validated here; it is catalog data
    /// and is enforced on the next `enroll`, not retroactively.
    #[must_use]
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let mut state = LedgerState::default();
        for (user, courses) in snapshot.0 {
            for course in courses {
                state.insert(&user, course);
            }
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Number of distinct users currently holding `course`. Side-effect-free.
    #[must_use]
    pub fn current_enrollment(&self, course: CourseId) -> usize {
        self.read().holder_count(course)
    }

    /// Attempt to enroll `user` in `course` under the given capacity.
    ///
    /// Idempotent: a user who already holds the course gets
    /// [`EnrollOutcome::AlreadyEnrolled`] without consuming a seat. A full
    /// course rejects with [`EnrollError::CapacityExceeded`] and leaves state
    /// unchanged. Capacity 0 means the course is never enrollable.
    pub fn enroll(
        &self,
        user: &UserId,
        course: CourseId,
        capacity: u32,
    ) -> Result<EnrollOutcome, EnrollError> {
        let mut state = self.write();

        if state
            .holdings
            .get(user)
            .is_some_and(|courses| courses.contains(&course))
        {
            return Ok(EnrollOutcome::AlreadyEnrolled);
        }

        if state.holder_count(course) >= capacity as usize {
            debug!(%user, %course, capacity, "enrollment rejected: course full");
            return Err(EnrollError::CapacityExceeded { course, capacity });
        }

        state.insert(user, course);
        debug!(%user, %course, "enrolled");
        Ok(EnrollOutcome::Enrolled)
    }

    /// Remove `course` from `user`'s holdings. Total: withdrawing a course
    /// the user does not hold is a successful no-op.
    pub fn withdraw(&self, user: &UserId, course: CourseId) -> WithdrawOutcome {
        let removed = self.write().remove(user, course);
        if removed {
            debug!(%user, %course, "withdrawn");
            WithdrawOutcome::Withdrawn
        } else {
            WithdrawOutcome::NotEnrolled
        }
    }

    /// The set of courses `user` currently holds. Read-only snapshot; empty
    /// for users the ledger has never seen.
    #[must_use]
    pub fn enrollments_for(&self, user: &UserId) -> BTreeSet<CourseId> {
        self.read().holdings.get(user).cloned().unwrap_or_default()
    }

    /// Snapshot the full ledger for persistence.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        let state = self.read();
        LedgerSnapshot(
            state
                .holdings
                .iter()
                .map(|(user, courses)| (user.clone(), courses.clone()))
                .collect(),
        )
    }

    /// Drop every enrollment. Used by the surrounding application's
    /// system-reset path.
    pub fn clear(&self) {
        let mut state = self.write();
        state.holdings.clear();
        state.rosters.clear();
        debug!("ledger cleared");
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LedgerState> {
        self.state.read().expect("ledger lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LedgerState> {
        self.state.write().expect("ledger lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier, Mutex};

    use super::*;

    fn user(name: &str) -> UserId {
        UserId::new(name)
    }

    #[test]
    fn enroll_until_full_then_reject() {
        let ledger = Ledger::new();
        let course = CourseId::new(101);

        assert_eq!(
            ledger.enroll(&user("a"), course, 2),
            Ok(EnrollOutcome::Enrolled)
        );
        assert_eq!(
            ledger.enroll(&user("b"), course, 2),
            Ok(EnrollOutcome::Enrolled)
        );
        assert_eq!(
            ledger.enroll(&user("c"), course, 2),
            Err(EnrollError::CapacityExceeded {
                course,
                capacity: 2
            })
        );
        assert_eq!(ledger.current_enrollment(course), 2);
    }

    #[test]
    fn withdraw_frees_a_seat_for_retry() {
        let ledger = Ledger::new();
        let course = CourseId::new(101);

        ledger.enroll(&user("a"), course, 2).expect("a enrolls");
        ledger.enroll(&user("b"), course, 2).expect("b enrolls");
        assert!(ledger.enroll(&user("c"), course, 2).is_err());

        assert_eq!(
            ledger.withdraw(&user("a"), course),
            WithdrawOutcome::Withdrawn
        );
        assert_eq!(
            ledger.enroll(&user("c"), course, 2),
            Ok(EnrollOutcome::Enrolled)
        );
        assert_eq!(ledger.current_enrollment(course), 2);
    }

    #[test]
    fn enroll_is_idempotent() {
        let ledger = Ledger::new();
        let course = CourseId::new(101);
        let u = user("a");

        assert_eq!(ledger.enroll(&u, course, 1), Ok(EnrollOutcome::Enrolled));
        assert_eq!(
            ledger.enroll(&u, course, 1),
            Ok(EnrollOutcome::AlreadyEnrolled)
        );
        assert_eq!(ledger.current_enrollment(course), 1);
        assert_eq!(ledger.snapshot(), {
            let once = Ledger::new();
            once.enroll(&u, course, 1).expect("enroll");
            once.snapshot()
        });
    }

    #[test]
    fn double_enroll_does_not_consume_a_second_seat() {
        let ledger = Ledger::new();
        let course = CourseId::new(101);

        ledger.enroll(&user("a"), course, 2).expect("first");
        ledger.enroll(&user("a"), course, 2).expect("repeat");
        assert_eq!(
            ledger.enroll(&user("b"), course, 2),
            Ok(EnrollOutcome::Enrolled)
        );
    }

    #[test]
    fn withdraw_of_non_holder_is_a_noop() {
        let ledger = Ledger::new();
        assert_eq!(
            ledger.withdraw(&user("ghost"), CourseId::new(101)),
            WithdrawOutcome::NotEnrolled
        );
        assert_eq!(ledger.current_enrollment(CourseId::new(101)), 0);
    }

    #[test]
    fn capacity_zero_is_never_enrollable() {
        let ledger = Ledger::new();
        let course = CourseId::new(7);
        for name in ["a", "b", "c"] {
            assert_eq!(
                ledger.enroll(&user(name), course, 0),
                Err(EnrollError::CapacityExceeded {
                    course,
                    capacity: 0
                })
            );
        }
        assert_eq!(ledger.current_enrollment(course), 0);
    }

    #[test]
    fn enrollments_for_is_order_independent() {
        let a = Ledger::new();
        a.enroll(&user("a"), CourseId::new(101), 5).expect("101");
        a.enroll(&user("a"), CourseId::new(102), 5).expect("102");

        let b = Ledger::new();
        b.enroll(&user("a"), CourseId::new(102), 5).expect("102");
        b.enroll(&user("a"), CourseId::new(101), 5).expect("101");

        let expected: BTreeSet<_> = [CourseId::new(101), CourseId::new(102)].into();
        assert_eq!(a.enrollments_for(&user("a")), expected);
        assert_eq!(b.enrollments_for(&user("a")), expected);
    }

    #[test]
    fn snapshot_round_trips_through_restore() {
        let ledger = Ledger::new();
        ledger
            .enroll(&user("a"), CourseId::new(101), 5)
            .expect("a 101");
        ledger
            .enroll(&user("b"), CourseId::new(101), 5)
            .expect("b 101");
        ledger
            .enroll(&user("b"), CourseId::new(103), 5)
            .expect("b 103");

        let restored = Ledger::from_snapshot(ledger.snapshot());
        assert_eq!(restored.current_enrollment(CourseId::new(101)), 2);
        assert_eq!(
            restored.enrollments_for(&user("b")),
            [CourseId::new(101), CourseId::new(103)].into()
        );
        assert_eq!(restored.snapshot(), ledger.snapshot());
    }

    #[test]
    fn clear_empties_everything() {
        let ledger = Ledger::new();
        ledger
            .enroll(&user("a"), CourseId::new(101), 5)
            .expect("enroll");
        ledger.clear();
        assert_eq!(ledger.current_enrollment(CourseId::new(101)), 0);
        assert!(ledger.enrollments_for(&user("a")).is_empty());
    }

    #[test]
    fn concurrent_enrolls_never_overshoot_capacity() {
        const CAPACITY: u32 = 4;
        const ATTEMPTS: usize = CAPACITY as usize + 5;

        let ledger = Arc::new(Ledger::new());
        let course = CourseId::new(200);
        let barrier = Arc::new(Barrier::new(ATTEMPTS));
        let results = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..ATTEMPTS)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                let barrier = Arc::clone(&barrier);
                let results = Arc::clone(&results);
                std::thread::spawn(move || {
                    let u = UserId::new(format!("user-{i}"));
                    barrier.wait();
                    let outcome = ledger.enroll(&u, course, CAPACITY);
                    results.lock().expect("results lock").push(outcome);
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread join");
        }

        let results = results.lock().expect("results lock");
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let rejections = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(EnrollError::CapacityExceeded { capacity: CAPACITY, .. })
                )
            })
            .count();

        assert_eq!(successes, CAPACITY as usize);
        assert_eq!(rejections, 5);
        assert_eq!(ledger.current_enrollment(course), CAPACITY as usize);
    }

    #[test]
    fn concurrent_enroll_and_withdraw_hold_the_invariant() {
        const CAPACITY: u32 = 3;

        let ledger = Arc::new(Ledger::new());
        let course = CourseId::new(300);
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let u = UserId::new(format!("user-{i}"));
                    barrier.wait();
                    for _ in 0..50 {
                        let _ = ledger.enroll(&u, course, CAPACITY);
                        assert!(ledger.current_enrollment(course) <= CAPACITY as usize);
                        ledger.withdraw(&u, course);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread join");
        }

        assert!(ledger.current_enrollment(course) <= CAPACITY as usize);
    }

    #[test]
    fn snapshot_json_shape_is_user_to_course_list() {
        let ledger = Ledger::new();
        ledger
            .enroll(&user("student"), CourseId::new(101), 5)
            .expect("enroll");
        ledger
            .enroll(&user("student"), CourseId::new(103), 5)
            .expect("enroll");

        let json = serde_json::to_value(ledger.snapshot()).expect("serialize");
        assert_eq!(json, serde_json::json!({ "student": [101, 103] }));
    }
}
