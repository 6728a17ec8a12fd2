//! Registrar: the facade the request-handling layer talks to.
//!
//! Joins a [`Catalog`] with the [`Ledger`]: resolves the authoritative
//! capacity for each enrollment attempt, maps unknown course ids to a request
//! error, and delegates the atomic check-then-act to the ledger.

use std::collections::BTreeSet;

use rollcall_types::{CourseId, EnrollError, EnrollOutcome, UserId, WithdrawOutcome};
use tracing::debug;

use crate::catalog::Catalog;
use crate::ledger::{Ledger, LedgerSnapshot};

/// Owns the enrollment ledger and consults a catalog for capacity.
///
/// One instance is created by the application and injected into request
/// handlers; there is no ambient global state.
#[derive(Debug)]
pub struct Registrar<C> {
    catalog: C,
    ledger: Ledger,
}

impl<C: Catalog> Registrar<C> {
    /// A registrar over an empty ledger.
    pub fn new(catalog: C) -> Self {
        Self::with_ledger(catalog, Ledger::new())
    }

    /// A registrar over a restored ledger (e.g. loaded from disk at startup).
    pub fn with_ledger(catalog: C, ledger: Ledger) -> Self {
        Self { catalog, ledger }
    }

    /// Enroll `user` in `course`, reading capacity from the catalog.
    ///
    /// Fails with [`EnrollError::UnknownCourse`] when the catalog has no such
    /// course, and [`EnrollError::CapacityExceeded`] when it is full.
    pub fn enroll(&self, user: &UserId, course: CourseId) -> Result<EnrollOutcome, EnrollError> {
        let Some(capacity) = self.catalog.capacity(course) else {
            debug!(%user, %course, "enrollment rejected: unknown course");
            return Err(EnrollError::UnknownCourse { course });
        };
        self.ledger.enroll(user, course, capacity)
    }

    /// Withdraw `user` from `course`. Total, like the ledger operation.
    pub fn withdraw(&self, user: &UserId, course: CourseId) -> WithdrawOutcome {
        self.ledger.withdraw(user, course)
    }

    /// Distinct users currently holding `course`.
    #[must_use]
    pub fn current_enrollment(&self, course: CourseId) -> usize {
        self.ledger.current_enrollment(course)
    }

    /// Courses `user` currently holds.
    #[must_use]
    pub fn enrollments_for(&self, user: &UserId) -> BTreeSet<CourseId> {
        self.ledger.enrollments_for(user)
    }

    /// Snapshot of the underlying ledger for persistence.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot()
    }

    /// The catalog this registrar consults.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Mutable access to the catalog (course CRUD lives there).
    pub fn catalog_mut(&mut self) -> &mut C {
        &mut self.catalog
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}
