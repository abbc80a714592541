//! RESET RETRY COUNTER (INS 0x2C, spec.md section 4.5).

use crate::acs::{Credential, VerifyOutcome};
use crate::api::{internal_tags, StatusWord};
use crate::apdu::CommandApdu;
use crate::do_store::PutResult;
use crate::rewrap::{gpg_change_keystring, RewrapOutcome};
use crate::session::Session;

pub fn handle(session: &mut Session, apdu: &CommandApdu) {
    match apdu.p1() {
        0x00 => by_reset_code(session, apdu),
        0x02 => by_admin(session, apdu),
        _ => session.res.status_only(StatusWord::BAD_P0_P1),
    }
}

fn by_reset_code(session: &mut Session, apdu: &CommandApdu) {
    let Some((old_len, rc_digest)) = session.rc_record() else {
        session.res.status_only(StatusWord::SECURITY_FAILURE);
        return;
    };
    if session.is_locked(Credential::ResetCode) {
        session.res.status_only(StatusWord::AUTH_BLOCKED);
        return;
    }
    let payload = apdu.data();
    if payload.len() < old_len {
        session.res.status_only(StatusWord::GENERIC_ERROR);
        return;
    }
    let (old_pw, new_pw) = payload.split_at(old_len);
    let old_ks = session.crypto.sha1(old_pw);
    let new_ks = session.crypto.sha1(new_pw);

    let outcome = gpg_change_keystring(&mut *session.do_store, Credential::ResetCode, &old_ks, Credential::User, &new_ks);
    match outcome {
        RewrapOutcome::CryptoFail => {
            session.acs.check(Credential::ResetCode, &[], &rc_digest);
            session.res.status_only(StatusWord::SECURITY_FAILURE);
            return;
        }
        RewrapOutcome::IoFail => {
            session.res.status_only(StatusWord::MEMORY_FAILURE);
            return;
        }
        RewrapOutcome::Migrated(0) => {
            // No keys were present to cryptographically confirm old_ks;
            // fall back to comparing directly against the stored RC digest.
            match session.acs.check(Credential::ResetCode, &old_ks, &rc_digest) {
                VerifyOutcome::Granted => {}
                VerifyOutcome::Blocked => {
                    session.res.status_only(StatusWord::AUTH_BLOCKED);
                    return;
                }
                VerifyOutcome::Failed => {
                    session.res.status_only(StatusWord::SECURITY_FAILURE);
                    return;
                }
            }
        }
        RewrapOutcome::Migrated(_) => {
            session.acs.reset_counter(Credential::ResetCode);
        }
    }

    session.acs.reset_counter(Credential::User);
    session.acs.clear_pso_cds();
    if session.put_record(internal_tags::PW1_RECORD, new_pw.len(), &new_ks) == PutResult::IoFail {
        session.res.status_only(StatusWord::MEMORY_FAILURE);
        return;
    }
    session.res.status_only(StatusWord::SUCCESS);
}

fn by_admin(session: &mut Session, apdu: &CommandApdu) {
    if !session.acs.admin_authorized() {
        session.res.status_only(StatusWord::SECURITY_FAILURE);
        return;
    }
    let new_pw = apdu.data();
    let admin_digest = session.effective_pw3_digest();
    let new_ks = session.crypto.sha1(new_pw);

    match gpg_change_keystring(&mut *session.do_store, Credential::Admin, &admin_digest, Credential::User, &new_ks) {
        RewrapOutcome::CryptoFail => session.res.status_only(StatusWord::SECURITY_FAILURE),
        RewrapOutcome::IoFail => session.res.status_only(StatusWord::MEMORY_FAILURE),
        RewrapOutcome::Migrated(_) => {
            if session.put_record(internal_tags::PW1_RECORD, new_pw.len(), &new_ks) == PutResult::IoFail {
                session.res.status_only(StatusWord::MEMORY_FAILURE);
                return;
            }
            session.acs.clear_pso_cds();
            session.acs.reset_counter(Credential::User);
            session.res.status_only(StatusWord::SUCCESS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardConfig;
    use crate::crypto::RsaSha1Backend;
    use crate::do_store::InMemoryDoStore;

    fn new_session() -> Session {
        Session::new(Box::new(InMemoryDoStore::new()), Box::new(RsaSha1Backend), CardConfig::default())
    }

    #[test]
    fn reset_by_admin_then_verify_new_pw1() {
        let mut session = new_session();
        session.acs.set_admin(true);
        let new_pw = b"newpw123";
        let mut bytes = vec![0x00, 0x2C, 0x02, 0x00, new_pw.len() as u8];
        bytes.extend_from_slice(new_pw);
        let apdu = CommandApdu::parse(&bytes).unwrap();
        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::SUCCESS));
        assert_eq!(session.effective_pw1_digest(), session.crypto.sha1(new_pw));
    }

    #[test]
    fn reset_by_admin_without_auth_is_security_failure() {
        let mut session = new_session();
        let bytes = [0x00, 0x2C, 0x02, 0x00, 0x01, b'x'];
        let apdu = CommandApdu::parse(&bytes).unwrap();
        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::SECURITY_FAILURE));
    }

    #[test]
    fn reset_by_rc_without_rc_record_is_security_failure() {
        let mut session = new_session();
        let bytes = [0x00, 0x2C, 0x00, 0x00, 0x02, b'x', b'y'];
        let apdu = CommandApdu::parse(&bytes).unwrap();
        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::SECURITY_FAILURE));
    }
}
