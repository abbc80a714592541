//! PERFORM SECURITY OPERATION (INS 0x2A, spec.md section 4.6).

use crate::acs::Credential;
use crate::api::StatusWord;
use crate::apdu::CommandApdu;
use crate::do_store::{LoadKeyResult, Purpose};
use crate::session::Session;

/// `cmd_APDU` length for a short-Lc digital-signature request: CLA INS
/// P1 P2 Lc + 35-byte DigestInfo, optionally followed by Le.
const SIGN_DIGEST_INFO_LEN: usize = 35;
const SIGN_REQUEST_LEN: usize = 8 + SIGN_DIGEST_INFO_LEN;

pub fn handle(session: &mut Session, apdu: &CommandApdu) {
    match (apdu.p1(), apdu.p2()) {
        (0x9E, 0x9A) => compute_digital_signature(session, apdu),
        (0x80, 0x86) => decrypt(session, apdu),
        _ => session.res.status_only(StatusWord::GENERIC_ERROR),
    }
}

fn compute_digital_signature(session: &mut Session, apdu: &CommandApdu) {
    if !session.acs.pso_cds_authorized() {
        session.res.status_only(StatusWord::SECURITY_FAILURE);
        return;
    }
    if apdu.total_len() != SIGN_REQUEST_LEN && apdu.total_len() != SIGN_REQUEST_LEN + 1 {
        session.res.status_only(StatusWord::GENERIC_ERROR);
        return;
    }
    let digest_info = apdu.data();

    let pw1_digest = session.effective_pw1_digest();
    let key = match session.do_store.load_prvkey(Purpose::Signing, Credential::User, &pw1_digest) {
        LoadKeyResult::Present(key) => key,
        _ => {
            session.acs.clear_pso_cds();
            session.res.status_only(StatusWord::GENERIC_ERROR);
            return;
        }
    };

    match session.crypto.rsa_sign(&key, digest_info) {
        Ok(sig) => {
            if !session.config.pw1_lifetime {
                session.acs.clear_pso_cds();
            }
            increment_sig_counter(session);
            session.res.set(&sig, StatusWord::SUCCESS);
        }
        Err(_) => {
            session.acs.clear_pso_cds();
            session.res.status_only(StatusWord::GENERIC_ERROR);
        }
    }
}

fn decrypt(session: &mut Session, apdu: &CommandApdu) {
    if session.acs.is_locked(Credential::User) {
        session.res.status_only(StatusWord::AUTH_BLOCKED);
        return;
    }
    if !session.acs.pso_other_authorized() {
        session.res.status_only(StatusWord::SECURITY_FAILURE);
        return;
    }

    let pw1_digest = session.effective_pw1_digest();
    let key = match session.do_store.load_prvkey(Purpose::Decryption, Credential::User, &pw1_digest) {
        LoadKeyResult::Present(key) => key,
        _ => {
            session.acs.check(Credential::User, &[], &pw1_digest);
            session.res.status_only(StatusWord::SECURITY_FAILURE);
            return;
        }
    };
    session.acs.check(Credential::User, &pw1_digest, &pw1_digest);
    session.acs.clear_pso_other();

    let Some((&0x00, ciphertext)) = apdu.data().split_first() else {
        session.res.status_only(StatusWord::GENERIC_ERROR);
        return;
    };
    match session.crypto.rsa_decrypt(&key, ciphertext) {
        Ok(plaintext) => session.res.set(&plaintext, StatusWord::SUCCESS),
        Err(_) => session.res.status_only(StatusWord::GENERIC_ERROR),
    }
}

/// Bumps the OpenPGP Card v2 digital-signature counter DO (tag 0x93, a
/// 3-byte big-endian value) on every successful PSO-CDS (spec.md section
/// 4.6; the counter itself is SPEC_FULL.md's supplemented feature B.2).
fn increment_sig_counter(session: &mut Session) {
    let current = session
        .do_store
        .get_data(crate::api::SIG_COUNTER_TAG)
        .filter(|b| b.len() == 3)
        .map(|b| u32::from_be_bytes([0, b[0], b[1], b[2]]))
        .unwrap_or(0);
    let next = current.saturating_add(1).to_be_bytes();
    if let crate::do_store::PutResult::IoFail = session.do_store.put_data(crate::api::SIG_COUNTER_TAG, &next[1..]) {
        log::warn!("failed to persist digital-signature counter");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardConfig;
    use crate::crypto::RsaSha1Backend;
    use crate::do_store::InMemoryDoStore;
    use rand::rngs::OsRng;
    use rsa::RsaPrivateKey;

    fn new_session() -> Session {
        Session::new(Box::new(InMemoryDoStore::new()), Box::new(RsaSha1Backend), CardConfig::default())
    }

    #[test]
    fn sign_without_auth_is_security_failure() {
        let mut session = new_session();
        let mut bytes = vec![0x00, 0x2A, 0x9E, 0x9A, SIGN_DIGEST_INFO_LEN as u8];
        bytes.extend_from_slice(&[0xAA; SIGN_DIGEST_INFO_LEN]);
        let apdu = CommandApdu::parse(&bytes).unwrap();
        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::SECURITY_FAILURE));
    }

    #[test]
    fn sign_single_shot_then_blocked_on_second_attempt() {
        let mut session = new_session();
        let key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let pw1_digest = session.effective_pw1_digest();
        session.do_store.install_prvkey(Purpose::Signing, Credential::User, &pw1_digest, &key);
        session.acs.set_pso_cds(true);

        let mut bytes = vec![0x00, 0x2A, 0x9E, 0x9A, SIGN_DIGEST_INFO_LEN as u8];
        bytes.extend_from_slice(&[0xAA; SIGN_DIGEST_INFO_LEN]);
        let apdu = CommandApdu::parse(&bytes).unwrap();

        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::SUCCESS));
        assert!(!session.acs.pso_cds_authorized());

        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::SECURITY_FAILURE));
    }

    #[test]
    fn decrypt_round_trips_padded_ciphertext() {
        let mut session = new_session();
        let key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let public = key.to_public_key();
        let pw1_digest = session.effective_pw1_digest();
        session.do_store.install_prvkey(Purpose::Decryption, Credential::User, &pw1_digest, &key);
        session.acs.set_pso_other(true);

        let ciphertext = public.encrypt(&mut OsRng, rsa::Pkcs1v15Encrypt, b"hello").unwrap();
        let mut payload = vec![0x00];
        payload.extend_from_slice(&ciphertext);
        let mut bytes = vec![0x00, 0x2A, 0x80, 0x86, 0x00];
        bytes.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&payload);
        let apdu = CommandApdu::parse(&bytes).unwrap();

        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::SUCCESS));
        assert_eq!(session.res.payload(), b"hello");
        assert!(!session.acs.pso_other_authorized());
    }
}
