//! The instruction-byte dispatch table (spec.md section 4.1). Replaces
//! the original firmware's function-pointer table with an exhaustive
//! match over `Ins` so an unrecognized INS is a data value, not an
//! unreachable branch (spec.md section 9).

use crate::api::{Ins, StatusWord};
use crate::apdu::CommandApdu;
use crate::handlers;
use crate::session::Session;

/// Parses `request` and runs the matching handler against `session`,
/// leaving the response in `session.res`. Every path through here writes
/// exactly one SW1/SW2 pair (spec.md section 8's first universal
/// invariant) -- a parse failure writes GENERIC_ERROR itself rather than
/// handing a malformed APDU to a handler.
pub fn dispatch(session: &mut Session, request: &[u8]) {
    let apdu = match CommandApdu::parse(request) {
        Ok(apdu) => apdu,
        Err(sw) => {
            session.res.status_only(sw);
            return;
        }
    };

    match Ins::from_byte(apdu.ins()) {
        Some(ins) => {
            log::debug!("dispatch {:?}", ins);
            match ins {
                Ins::SelectFile => handlers::select_file::handle(session, &apdu),
                Ins::Verify => handlers::verify::handle(session, &apdu),
                Ins::ChangeReferenceData => handlers::change_reference_data::handle(session, &apdu),
                Ins::ResetRetryCounter => handlers::reset_retry_counter::handle(session, &apdu),
                Ins::Pso => handlers::pso::handle(session, &apdu),
                Ins::InternalAuthenticate => handlers::internal_authenticate::handle(session, &apdu),
                Ins::GenerateAsymKeyPair => handlers::generate_asym_keypair::handle(session, &apdu),
                Ins::ReadBinary => handlers::read_binary::handle(session, &apdu),
                Ins::GetData => handlers::get_put_data::handle_get(session, &apdu),
                Ins::PutData | Ins::PutDataOdd => handlers::get_put_data::handle_put(session, &apdu),
            }
        }
        None => {
            log::warn!("unrecognized INS {:#04x}", apdu.ins());
            session.res.status_only(StatusWord::WRONG_INS);
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
    fn unknown_ins_is_wrong_ins() {
        let mut session = new_session();
        dispatch(&mut session, &[0x00, 0xFF, 0x00, 0x00, 0x00]);
        assert_eq!(session.res.status_word(), Some(StatusWord::WRONG_INS));
    }

    #[test]
    fn truncated_request_is_generic_error() {
        let mut session = new_session();
        dispatch(&mut session, &[0x00, 0x20]);
        assert_eq!(session.res.status_word(), Some(StatusWord::GENERIC_ERROR));
    }

    #[test]
    fn every_dispatch_writes_a_status_word() {
        let mut session = new_session();
        dispatch(&mut session, &[0x00, 0xA4, 0x04, 0x00, 0x06, 0xD2, 0x76, 0x00, 0x01, 0x24, 0x01]);
        assert!(session.res.len() >= 2);
        assert!(session.res.status_word().is_some());
    }
}
