//! Card configuration: the values spec.md treats as given (AID,
//! single-shot PSO-CDS lifetime, retry-counter maxima, factory PW1).
//! Built once at startup and immutable thereafter; the core itself
//! never reads environment variables or files (SPEC_FULL.md section A.3).

use crate::acs::RetryLimits;
use crate::api::OPENPGP_RID;

#[derive(Debug, Clone)]
pub struct CardConfig {
    /// Application Identifier; first byte transmitted is its own length.
    pub aid: Vec<u8>,
    /// If false, a successful PSO-CDS is single-shot: the authorization
    /// is cleared before the next command.
    pub pw1_lifetime: bool,
    pub retry_limits: RetryLimits,
    pub factory_pw1: &'static [u8],
    /// Factory admin PIN, used only when no PW3 keystring record has
    /// ever been written. Not specified by spec.md; the OpenPGP Card v2
    /// factory default of "12345678" is used here (see DESIGN.md).
    pub factory_pw3: &'static [u8],
}

impl Default for CardConfig {
    fn default() -> Self {
        let mut aid = Vec::with_capacity(1 + OPENPGP_RID.len());
        aid.push(OPENPGP_RID.len() as u8);
        aid.extend_from_slice(&OPENPGP_RID);
        CardConfig {
            aid,
            pw1_lifetime: false,
            retry_limits: RetryLimits::default(),
            factory_pw1: crate::api::FACTORY_PW1,
            factory_pw3: b"12345678",
        }
    }
}

impl CardConfig {
    pub fn new(pw1_lifetime: bool, retry_limits: RetryLimits) -> Self {
        CardConfig { pw1_lifetime, retry_limits, ..Default::default() }
    }
}
