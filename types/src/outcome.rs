/// Result of a successful enrollment attempt.
///
/// `AlreadyEnrolled` is a success, not an error: enrolling twice leaves the
/// ledger exactly as enrolling once does, and callers retrying after a lost
/// response must not see a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// The user now holds the course and did not before.
    Enrolled,
    /// The user already held the course; nothing changed.
    AlreadyEnrolled,
}

impl EnrollOutcome {
    /// Whether this attempt actually mutated the ledger.
    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, Self::Enrolled)
    }
}

/// Result of a withdrawal. Withdrawals are total; absence is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawOutcome {
    /// The course was removed from the user's holdings.
    Withdrawn,
    /// The user did not hold the course; nothing changed.
    NotEnrolled,
}

impl WithdrawOutcome {
    /// Whether this withdrawal actually mutated the ledger.
    #[must_use]
    pub fn is_removed(self) -> bool {
        matches!(self, Self::Withdrawn)
    }
}
