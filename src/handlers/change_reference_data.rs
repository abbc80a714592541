//! CHANGE REFERENCE DATA (INS 0x24, spec.md section 4.4).

use crate::acs::Credential;
use crate::api::{internal_tags, StatusWord};
use crate::apdu::CommandApdu;
use crate::do_store::PutResult;
use crate::rewrap::{gpg_change_keystring, RewrapOutcome};
use crate::session::Session;

pub fn handle(session: &mut Session, apdu: &CommandApdu) {
    match apdu.p2() {
        0x81 => change_pw1(session, apdu),
        0x83 => change_pw3(session, apdu),
        _ => session.res.status_only(StatusWord::BAD_P0_P1),
    }
}

fn change_pw1(session: &mut Session, apdu: &CommandApdu) {
    let old_len = session.pw1_old_len();
    let payload = apdu.data();
    if payload.len() < old_len {
        session.res.status_only(StatusWord::GENERIC_ERROR);
        return;
    }
    let (old_pw, new_pw) = payload.split_at(old_len);
    let old_ks = session.crypto.sha1(old_pw);
    let new_ks = session.crypto.sha1(new_pw);

    match gpg_change_keystring(&mut *session.do_store, Credential::User, &old_ks, Credential::User, &new_ks) {
        RewrapOutcome::CryptoFail => session.res.status_only(StatusWord::SECURITY_FAILURE),
        RewrapOutcome::IoFail => session.res.status_only(StatusWord::MEMORY_FAILURE),
        RewrapOutcome::Migrated(_) => {
            // Whether or not any key needed migrating, the stored PW1
            // record must reflect the new digest so the next VERIFY
            // compares against it.
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

fn change_pw3(session: &mut Session, apdu: &CommandApdu) {
    if session.is_locked(Credential::Admin) {
        session.res.status_only(StatusWord::AUTH_BLOCKED);
        return;
    }
    let payload = apdu.data();
    let expected = session.effective_pw3_digest();
    let Some(split) = find_pw3_split(session, payload, &expected) else {
        // No candidate split matched the stored admin digest: force the
        // same failure-counting path `check` uses for a bad VERIFY.
        session.acs.check(Credential::Admin, &[], &expected);
        session.res.status_only(StatusWord::SECURITY_FAILURE);
        return;
    };
    session.acs.reset_counter(Credential::Admin);

    let (old_pw, new_pw) = payload.split_at(split);
    let old_ks = session.crypto.sha1(old_pw);
    let new_ks = session.crypto.sha1(new_pw);

    match gpg_change_keystring(&mut *session.do_store, Credential::Admin, &old_ks, Credential::Admin, &new_ks) {
        RewrapOutcome::CryptoFail => session.res.status_only(StatusWord::SECURITY_FAILURE),
        RewrapOutcome::IoFail => session.res.status_only(StatusWord::MEMORY_FAILURE),
        RewrapOutcome::Migrated(_) => {
            if session.put_pw3_digest(&new_ks) == PutResult::IoFail {
                session.res.status_only(StatusWord::MEMORY_FAILURE);
                return;
            }
            session.acs.reset_counter(Credential::Admin);
            session.res.status_only(StatusWord::SUCCESS);
        }
    }
}

/// PW3's old/new split point isn't carried by a length byte the way
/// PW1/RC's is -- the admin keystring record is just a bare 20-byte
/// digest (spec.md section 3). Scan candidate split points against the
/// currently effective admin digest, the way a verify-with-length call
/// would (spec.md section 4.4).
fn find_pw3_split(session: &Session, payload: &[u8], expected: &[u8; 20]) -> Option<usize> {
    for split in 1..payload.len() {
        let (candidate_old, _) = payload.split_at(split);
        if &session.crypto.sha1(candidate_old) == expected {
            return Some(split);
        }
    }
    None
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
    fn change_pw1_from_factory_default_then_verify() {
        let mut session = new_session();
        let mut payload = b"123456".to_vec();
        payload.extend_from_slice(b"abcdefgh");
        let mut bytes = vec![0x00, 0x24, 0x00, 0x81, payload.len() as u8];
        bytes.extend_from_slice(&payload);
        let apdu = CommandApdu::parse(&bytes).unwrap();
        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::SUCCESS));

        let new_digest = session.crypto.sha1(b"abcdefgh");
        assert_eq!(session.effective_pw1_digest(), new_digest);
        let old_digest = session.crypto.sha1(b"123456");
        assert_ne!(session.effective_pw1_digest(), old_digest);
    }

    #[test]
    fn wrong_old_pw1_length_is_generic_error() {
        let mut session = new_session();
        let bytes = [0x00, 0x24, 0x00, 0x81, 0x02, b'1', b'2'];
        let apdu = CommandApdu::parse(&bytes).unwrap();
        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::GENERIC_ERROR));
    }
}
