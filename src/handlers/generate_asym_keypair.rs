//! GENERATE ASYMMETRIC KEY PAIR (INS 0x47, spec.md section 4.8).
//!
//! Key generation itself is a declared non-goal (spec.md section 1); this
//! handler only implements the public-key readback path and the admin
//! gate for the unimplemented generation path. The redesign flagged in
//! spec.md section 9 -- the admin-unauthorized branch must return
//! immediately rather than fall through to GENERIC_ERROR after already
//! writing SECURITY_FAILURE -- is implemented here as two disjoint
//! `if`/`return` arms, not a fallthrough.

use crate::api::StatusWord;
use crate::apdu::CommandApdu;
use crate::do_store::Purpose;
use crate::session::Session;

/// Offset of the purpose byte within the full command buffer. Not a
/// standard OpenPGP Card v2 encoding -- spec.md section 4.8 only says
/// "the purpose byte at offset 7 of the APDU" without naming the
/// purpose-to-byte-value mapping, so this repo fixes one (see
/// DESIGN.md's Open Question log).
const PURPOSE_BYTE_OFFSET: usize = 7;

fn decode_purpose(b: u8) -> Option<Purpose> {
    match b {
        0x00 => Some(Purpose::Signing),
        0x01 => Some(Purpose::Decryption),
        0x02 => Some(Purpose::Authentication),
        _ => None,
    }
}

pub fn handle(session: &mut Session, apdu: &CommandApdu) {
    if apdu.p1() == 0x81 {
        read_public_key(session, apdu);
        return;
    }

    if !session.acs.admin_authorized() {
        session.res.status_only(StatusWord::SECURITY_FAILURE);
        return;
    }
    session.res.status_only(StatusWord::GENERIC_ERROR);
}

fn read_public_key(session: &mut Session, apdu: &CommandApdu) {
    let Some(purpose) = apdu.byte_at(PURPOSE_BYTE_OFFSET).and_then(decode_purpose) else {
        session.res.status_only(StatusWord::GENERIC_ERROR);
        return;
    };
    match session.do_store.get_public_key_der(purpose) {
        Some(der) => session.res.set(&der, StatusWord::SUCCESS),
        None => session.res.status_only(StatusWord::NO_RECORD),
    }
}
