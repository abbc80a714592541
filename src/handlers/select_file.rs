//! SELECT FILE (INS 0xA4, spec.md section 4.2).

use crate::api::{patch_mf_template, SelectedFile, StatusWord, EF_SERIAL_SELECTOR, MF_SELECTOR};
use crate::apdu::CommandApdu;
use crate::session::Session;

pub fn handle(session: &mut Session, apdu: &CommandApdu) {
    // The explicit 2-byte selectors are checked before the bare `P1 == 4`
    // precondition: spec.md section 8 scenario 5 selects EF_SERIAL with
    // `P1 == 4` and payload `2F 02`, the same P1 section 4.2 otherwise
    // reserves for "select by DF name". Neither the 2-byte EF_SERIAL/MF
    // selectors nor a real 6-byte AID payload can satisfy both checks at
    // once, so checking the short, explicit selectors first and falling
    // back to DF-name selection for anything else reconciles the two.
    if apdu.data() == EF_SERIAL_SELECTOR {
        session.file_selection = SelectedFile::EfSerial;
        session.res.status_only(StatusWord::SUCCESS);
        return;
    }
    if apdu.data() == MF_SELECTOR {
        session.file_selection = SelectedFile::Mf;
        if apdu.p2() == 0x0C {
            session.res.status_only(StatusWord::SUCCESS);
        } else {
            let total = session.do_store.total_do_bytes().min(u16::MAX as usize) as u16;
            let template = patch_mf_template(total);
            session.res.set(&template, StatusWord::SUCCESS);
        }
        return;
    }
    if apdu.p1() == 4 {
        session.file_selection = SelectedFile::DfOpenpgp;
        session.res.status_only(StatusWord::SUCCESS);
        return;
    }
    session.file_selection = SelectedFile::None;
    session.res.status_only(StatusWord::NO_FILE);
}
