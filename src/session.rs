//! The session object: the single piece of mutable state the worker
//! owns and passes to every handler by reference. Replaces the
//! original firmware's global-mutable-state convention (spec.md
//! section 9, "Global mutable state").

use crate::acs::{AccessControlState, Credential};
use crate::api::{internal_tags, SelectedFile};
use crate::apdu::ResponseApdu;
use crate::config::CardConfig;
use crate::crypto::CryptoBackend;
use crate::do_store::DoStore;

pub struct Session {
    pub file_selection: SelectedFile,
    pub acs: AccessControlState,
    pub do_store: Box<dyn DoStore + Send>,
    pub crypto: Box<dyn CryptoBackend + Send>,
    pub config: CardConfig,
    pub res: ResponseApdu,
}

impl Session {
    pub fn new(
        do_store: Box<dyn DoStore + Send>,
        crypto: Box<dyn CryptoBackend + Send>,
        config: CardConfig,
    ) -> Self {
        let acs = AccessControlState::new(config.retry_limits);
        Session { file_selection: SelectedFile::None, acs, do_store, crypto, config, res: ResponseApdu::new() }
    }

    /// A stored PW1/RC record is 21 bytes: a one-byte original-password
    /// length followed by the 20-byte SHA-1 digest (spec.md section 3).
    fn split_record(record: &[u8]) -> Option<(usize, [u8; 20])> {
        if record.len() != 21 {
            return None;
        }
        let mut digest = [0u8; 20];
        digest.copy_from_slice(&record[1..21]);
        Some((record[0] as usize, digest))
    }

    /// Length of the previously-set PW1, used by CHANGE REFERENCE DATA to
    /// split `old_pw || new_pw`. Falls back to the factory PW1's length
    /// when no record has been written yet.
    pub fn pw1_old_len(&self) -> usize {
        self.do_store
            .get_simple(internal_tags::PW1_RECORD)
            .as_deref()
            .and_then(Self::split_record)
            .map(|(len, _)| len)
            .unwrap_or(self.config.factory_pw1.len())
    }

    /// The digest VERIFY/PSO compare against for PW1: the stored record's
    /// digest, or SHA-1 of the factory PW1 if none has been written.
    pub fn effective_pw1_digest(&self) -> [u8; 20] {
        match self.do_store.get_simple(internal_tags::PW1_RECORD).as_deref().and_then(Self::split_record) {
            Some((_, digest)) => digest,
            None => self.crypto.sha1(self.config.factory_pw1),
        }
    }

    /// The digest VERIFY/ADMIN compare against for PW3. PW3's stored form
    /// is just the 20-byte digest (no length prefix), separate from the
    /// length byte PW1/RC carry.
    pub fn effective_pw3_digest(&self) -> [u8; 20] {
        match self.do_store.get_simple(internal_tags::PW3_RECORD) {
            Some(record) if record.len() == 20 => {
                let mut digest = [0u8; 20];
                digest.copy_from_slice(&record);
                digest
            }
            _ => self.crypto.sha1(self.config.factory_pw3),
        }
    }

    /// The stored RC record, if any: `(old_len, digest)`.
    pub fn rc_record(&self) -> Option<(usize, [u8; 20])> {
        self.do_store.get_simple(internal_tags::RC_RECORD).as_deref().and_then(Self::split_record)
    }

    /// Persists a full 21-byte PW1/RC record: length prefix + digest.
    pub fn put_record(&mut self, tag: u16, old_len: usize, digest: &[u8; 20]) -> crate::do_store::PutResult {
        let mut record = Vec::with_capacity(21);
        record.push(old_len as u8);
        record.extend_from_slice(digest);
        self.do_store.put_simple(tag, &record)
    }

    /// Persists the 20-byte PW3 digest.
    pub fn put_pw3_digest(&mut self, digest: &[u8; 20]) -> crate::do_store::PutResult {
        self.do_store.put_simple(internal_tags::PW3_RECORD, digest)
    }

    pub fn is_locked(&self, cred: Credential) -> bool {
        self.acs.is_locked(cred)
    }
}
