//! Capacity-bounded registration core.
//!
//! Three pieces: the [`Ledger`] owning the user→courses mapping and enforcing
//! per-course capacity atomically, the [`Catalog`] trait (with an in-memory
//! [`CourseCatalog`]) supplying authoritative capacities, and the
//! [`Registrar`] facade joining the two for request handlers.
//!
//! The ledger holds the one correctness-critical invariant of the system: for
//! every course, the number of distinct holders never exceeds its capacity,
//! under any interleaving of concurrent enroll/withdraw calls.

pub mod catalog;
pub mod ledger;
pub mod registrar;

pub use catalog::{Catalog, Course, CourseCatalog, DEFAULT_CAPACITY};
pub use ledger::{Ledger, LedgerSnapshot};
pub use registrar::Registrar;

// Re-export the domain types callers need alongside the API.
pub use rollcall_types::{CourseId, EnrollError, EnrollOutcome, UserId, WithdrawOutcome};
