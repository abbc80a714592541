//! INTERNAL AUTHENTICATE (INS 0x88, spec.md section 4.7). Shares its
//! PW1-unwrap/counter preconditions with PSO-decrypt but signs with the
//! AUTHENTICATION key instead of decrypting.

use crate::acs::Credential;
use crate::api::StatusWord;
use crate::apdu::CommandApdu;
use crate::do_store::{LoadKeyResult, Purpose};
use crate::session::Session;

pub fn handle(session: &mut Session, apdu: &CommandApdu) {
    if (apdu.p1(), apdu.p2()) != (0x00, 0x00) {
        session.res.status_only(StatusWord::BAD_P0_P1);
        return;
    }
    if session.acs.is_locked(Credential::User) {
        session.res.status_only(StatusWord::AUTH_BLOCKED);
        return;
    }
    if !session.acs.pso_other_authorized() {
        session.res.status_only(StatusWord::SECURITY_FAILURE);
        return;
    }

    let pw1_digest = session.effective_pw1_digest();
    let key = match session.do_store.load_prvkey(Purpose::Authentication, Credential::User, &pw1_digest) {
        LoadKeyResult::Present(key) => key,
        _ => {
            session.acs.check(Credential::User, &[], &pw1_digest);
            session.res.status_only(StatusWord::SECURITY_FAILURE);
            return;
        }
    };
    session.acs.check(Credential::User, &pw1_digest, &pw1_digest);
    session.acs.clear_pso_other();

    match session.crypto.rsa_sign(&key, apdu.data()) {
        Ok(sig) => session.res.set(&sig, StatusWord::SUCCESS),
        Err(_) => session.res.status_only(StatusWord::GENERIC_ERROR),
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
    fn authenticate_signs_challenge() {
        let mut session = new_session();
        let key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let public = key.to_public_key();
        let pw1_digest = session.effective_pw1_digest();
        session.do_store.install_prvkey(Purpose::Authentication, Credential::User, &pw1_digest, &key);
        session.acs.set_pso_other(true);

        let challenge = [0x11u8; 20];
        let mut bytes = vec![0x00, 0x88, 0x00, 0x00, challenge.len() as u8];
        bytes.extend_from_slice(&challenge);
        let apdu = CommandApdu::parse(&bytes).unwrap();

        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::SUCCESS));
        public.verify(rsa::Pkcs1v15Sign::new_unprefixed(), &challenge, session.res.payload()).unwrap();
    }

    #[test]
    fn wrong_p1_p2_is_bad_p0_p1() {
        let mut session = new_session();
        let bytes = [0x00, 0x88, 0x01, 0x00, 0x00];
        let apdu = CommandApdu::parse(&bytes).unwrap();
        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::BAD_P0_P1));
    }
}
