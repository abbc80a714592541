//! GET DATA / PUT DATA / PUT DATA ODD (INS 0xCA/0xDA/0xDB, spec.md
//! section 4.10). All tag-specific semantics live in the DO store; this
//! handler only gates on `file_selection`, forms the tag, and hands off.

use crate::api::{SelectedFile, StatusWord};
use crate::apdu::CommandApdu;
use crate::do_store::PutResult;
use crate::session::Session;

fn tag(apdu: &CommandApdu) -> u16 {
    ((apdu.p1() as u16) << 8) | apdu.p2() as u16
}

pub fn handle_get(session: &mut Session, apdu: &CommandApdu) {
    if session.file_selection != SelectedFile::DfOpenpgp {
        session.res.status_only(StatusWord::NO_RECORD);
        return;
    }
    match session.do_store.get_data(tag(apdu)) {
        Some(bytes) => session.res.set(&bytes, StatusWord::SUCCESS),
        None => session.res.status_only(StatusWord::NO_RECORD),
    }
}

pub fn handle_put(session: &mut Session, apdu: &CommandApdu) {
    if session.file_selection != SelectedFile::DfOpenpgp {
        session.res.status_only(StatusWord::NO_RECORD);
        return;
    }
    match session.do_store.put_data(tag(apdu), apdu.data()) {
        PutResult::Ok => session.res.status_only(StatusWord::SUCCESS),
        PutResult::IoFail => session.res.status_only(StatusWord::MEMORY_FAILURE),
    }
}
