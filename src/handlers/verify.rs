//! VERIFY (INS 0x20, spec.md section 4.3).

use crate::acs::{Credential, VerifyOutcome};
use crate::api::StatusWord;
use crate::apdu::CommandApdu;
use crate::session::Session;

pub fn handle(session: &mut Session, apdu: &CommandApdu) {
    let supplied = session.crypto.sha1(apdu.data());
    let (cred, expected) = match apdu.p2() {
        0x81 | 0x82 => (Credential::User, session.effective_pw1_digest()),
        0x83 => (Credential::Admin, session.effective_pw3_digest()),
        _ => {
            session.res.status_only(StatusWord::BAD_P0_P1);
            return;
        }
    };

    match session.acs.check(cred, &supplied, &expected) {
        VerifyOutcome::Failed => {
            log::warn!("VERIFY failed for P2={:#04x}", apdu.p2());
            session.res.status_only(StatusWord::SECURITY_FAILURE);
        }
        VerifyOutcome::Blocked => {
            session.res.status_only(StatusWord::AUTH_BLOCKED);
        }
        VerifyOutcome::Granted => {
            match apdu.p2() {
                0x81 => session.acs.set_pso_cds(true),
                0x82 => session.acs.set_pso_other(true),
                0x83 => session.acs.set_admin(true),
                _ => unreachable!(),
            }
            session.res.status_only(StatusWord::SUCCESS);
        }
    }
}
