//! Access-Control State (ACS): the three independent authorization
//! flags plus the per-credential retry counters and lockout logic.
//!
//! Mirrors the tri-state result convention the teacher tree uses for
//! `PasswordState` (`keystore-api::common`) rather than the original
//! firmware's `<0 / 0 / >0` integer convention spec.md's design notes
//! call out for abolition.

/// Which credential a VERIFY / CHANGE / RESET operation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Credential {
    /// PW1 -- user password.
    User,
    /// RC -- reset code.
    ResetCode,
    /// PW3 -- admin password.
    Admin,
}

/// Outcome of a credential check. Replaces the original firmware's
/// negative/zero/positive integer return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Digest mismatch (or credential not yet provisioned).
    Failed,
    /// Retry counter already exhausted -- the secret was not even consulted.
    Blocked,
    /// Digest matched.
    Granted,
}

/// Retry-counter maxima for the three credentials. The OpenPGP Card v2
/// default is 3 attempts for each of PW1, RC and PW3.
#[derive(Debug, Clone, Copy)]
pub struct RetryLimits {
    pub user: u8,
    pub reset_code: u8,
    pub admin: u8,
}

impl Default for RetryLimits {
    fn default() -> Self {
        RetryLimits { user: 3, reset_code: 3, admin: 3 }
    }
}

/// The three authorization flags and three error counters. Owned by the
/// `Session` and mutated only by the worker; independent and cleared at
/// reset (spec.md section 3, "Invariants").
#[derive(Debug, Clone, Default)]
pub struct AccessControlState {
    pso_cds_authorized: bool,
    pso_other_authorized: bool,
    admin_authorized: bool,
    err_user: u8,
    err_reset_code: u8,
    err_admin: u8,
    limits: RetryLimits,
}

impl AccessControlState {
    pub fn new(limits: RetryLimits) -> Self {
        AccessControlState { limits, ..Default::default() }
    }

    pub fn pso_cds_authorized(&self) -> bool {
        self.pso_cds_authorized
    }
    pub fn pso_other_authorized(&self) -> bool {
        self.pso_other_authorized
    }
    pub fn admin_authorized(&self) -> bool {
        self.admin_authorized
    }

    pub fn clear_pso_cds(&mut self) {
        self.pso_cds_authorized = false;
    }
    pub fn clear_pso_other(&mut self) {
        self.pso_other_authorized = false;
    }
    pub fn clear_admin(&mut self) {
        self.admin_authorized = false;
    }

    fn counter(&self, cred: Credential) -> u8 {
        match cred {
            Credential::User => self.err_user,
            Credential::ResetCode => self.err_reset_code,
            Credential::Admin => self.err_admin,
        }
    }

    fn counter_mut(&mut self, cred: Credential) -> &mut u8 {
        match cred {
            Credential::User => &mut self.err_user,
            Credential::ResetCode => &mut self.err_reset_code,
            Credential::Admin => &mut self.err_admin,
        }
    }

    fn limit(&self, cred: Credential) -> u8 {
        match cred {
            Credential::User => self.limits.user,
            Credential::ResetCode => self.limits.reset_code,
            Credential::Admin => self.limits.admin,
        }
    }

    pub fn error_count(&self, cred: Credential) -> u8 {
        self.counter(cred)
    }

    /// A password is locked iff its error counter has reached its
    /// per-credential maximum; a locked credential's verify always fails
    /// without consulting the secret.
    pub fn is_locked(&self, cred: Credential) -> bool {
        self.counter(cred) >= self.limit(cred)
    }

    /// Resets the named credential's retry counter to zero. Invariant:
    /// every persisted write of a keystring record resets the
    /// corresponding counter in the same logical transaction -- callers
    /// are responsible for calling this alongside the DO-store write.
    pub fn reset_counter(&mut self, cred: Credential) {
        *self.counter_mut(cred) = 0;
    }

    fn note_failure(&mut self, cred: Credential) {
        let limit = self.limit(cred);
        let c = self.counter_mut(cred);
        *c = c.saturating_add(1).min(limit);
    }

    /// Checks a freshly-supplied digest against `expected`, in constant
    /// time, applying the lockout and counter bookkeeping spec.md section
    /// 4.3 describes: negative increments the counter, positive resets
    /// it, and a counter already at its limit never reaches the
    /// comparison at all.
    pub fn check(&mut self, cred: Credential, supplied: &[u8], expected: &[u8]) -> VerifyOutcome {
        if self.is_locked(cred) {
            return VerifyOutcome::Blocked;
        }
        use subtle::ConstantTimeEq;
        let ok = supplied.len() == expected.len() && supplied.ct_eq(expected).into();
        if ok {
            self.reset_counter(cred);
            VerifyOutcome::Granted
        } else {
            self.note_failure(cred);
            VerifyOutcome::Failed
        }
    }

    /// VERIFY's three P2 variants (0x81/0x82/0x83) grant different flags
    /// even when two of them share the same underlying credential (PW1),
    /// so the flag to raise is the handler's call, not `check`'s.
    pub fn set_pso_cds(&mut self, v: bool) {
        self.pso_cds_authorized = v;
    }
    pub fn set_pso_other(&mut self, v: bool) {
        self.pso_other_authorized = v;
    }
    pub fn set_admin(&mut self, v: bool) {
        self.admin_authorized = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_out_after_limit() {
        let mut acs = AccessControlState::new(RetryLimits::default());
        for _ in 0..3 {
            assert_eq!(acs.check(Credential::User, b"wrong", b"right"), VerifyOutcome::Failed);
        }
        assert_eq!(acs.check(Credential::User, b"right", b"right"), VerifyOutcome::Blocked);
        assert_eq!(acs.error_count(Credential::User), 3);
    }

    #[test]
    fn success_resets_counter() {
        let mut acs = AccessControlState::new(RetryLimits::default());
        assert_eq!(acs.check(Credential::User, b"wrong", b"right"), VerifyOutcome::Failed);
        assert_eq!(acs.check(Credential::User, b"right", b"right"), VerifyOutcome::Granted);
        assert_eq!(acs.error_count(Credential::User), 0);
    }

    #[test]
    fn credentials_are_independent() {
        let mut acs = AccessControlState::new(RetryLimits::default());
        assert_eq!(acs.check(Credential::Admin, b"wrong", b"right"), VerifyOutcome::Failed);
        assert_eq!(acs.error_count(Credential::User), 0);
    }
}
