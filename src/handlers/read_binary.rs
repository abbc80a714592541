//! READ BINARY (INS 0xB0, spec.md section 4.9).

use crate::api::{SelectedFile, StatusWord};
use crate::apdu::CommandApdu;
use crate::session::Session;

pub fn handle(session: &mut Session, apdu: &CommandApdu) {
    if session.file_selection != SelectedFile::EfSerial {
        session.res.status_only(StatusWord::NO_RECORD);
        return;
    }
    if apdu.p2() >= 6 {
        session.res.status_only(StatusWord::BAD_P0_P1);
        return;
    }
    let mut payload = Vec::with_capacity(1 + session.config.aid.len());
    payload.push(0x5A);
    payload.extend_from_slice(&session.config.aid);
    session.res.set(&payload, StatusWord::SUCCESS);
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
    fn select_ef_serial_then_read_binary_returns_aid() {
        let mut session = new_session();
        crate::handlers::select_file::handle(
            &mut session,
            &CommandApdu::parse(&[0x00, 0xA4, 0x04, 0x00, 0x02, 0x2F, 0x02]).unwrap(),
        );
        assert_eq!(session.res.status_word(), Some(StatusWord::SUCCESS));

        let bytes = [0x00, 0xB0, 0x00, 0x00, 0x00];
        let apdu = CommandApdu::parse(&bytes).unwrap();
        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::SUCCESS));
        let mut expected = vec![0x5A];
        expected.extend_from_slice(&session.config.aid);
        assert_eq!(session.res.payload(), expected.as_slice());
    }

    #[test]
    fn read_binary_without_selection_is_no_record() {
        let mut session = new_session();
        let bytes = [0x00, 0xB0, 0x00, 0x00, 0x00];
        let apdu = CommandApdu::parse(&bytes).unwrap();
        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::NO_RECORD));
    }

    #[test]
    fn p2_out_of_range_is_bad_p0_p1() {
        let mut session = new_session();
        session.file_selection = SelectedFile::EfSerial;
        let bytes = [0x00, 0xB0, 0x00, 0x06, 0x00];
        let apdu = CommandApdu::parse(&bytes).unwrap();
        handle(&mut session, &apdu);
        assert_eq!(session.res.status_word(), Some(StatusWord::BAD_P0_P1));
    }
}
