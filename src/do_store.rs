//! Data Object (DO) store: a tag-indexed persistent mapping from 16-bit
//! tags to byte strings, plus the specialized wrapped-private-key slots.
//!
//! Flash-backed persistence is an external collaborator per spec.md's
//! scope section; this module defines the trait surface the core
//! consumes (spec.md section 6) and supplies `InMemoryDoStore`, a
//! reference implementation used by tests and the demo binary. A real
//! token would swap in a flash-backed store behind the same trait
//! without touching the dispatcher or handlers.

use std::collections::HashMap;

use crate::acs::Credential;
use rsa::pkcs8::EncodePublicKey;
use rsa::RsaPrivateKey;

/// One of the three long-lived RSA private keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    Signing,
    Decryption,
    Authentication,
}

impl Purpose {
    pub const ALL: [Purpose; 3] = [Purpose::Signing, Purpose::Decryption, Purpose::Authentication];
}

/// Result of attempting to load and unwrap a stored private key.
pub enum LoadKeyResult {
    /// No key has been stored for this purpose yet.
    Absent,
    /// Unwrapped successfully.
    Present(Box<RsaPrivateKey>),
    /// The key was present but failed to unwrap under the supplied keystring.
    CryptoFail,
    /// The backing store could not be read.
    IoFail,
}

/// Result of `chks_prvkey` re-wrapping a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKeystringResult {
    Ok,
    CryptoFail,
    IoFail,
}

/// Result of a `put_*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutResult {
    Ok,
    IoFail,
}

/// The DO store interface the core consumes (spec.md section 6).
pub trait DoStore {
    /// Reads a fixed single-value record (a keystring record, a counter)
    /// addressed by `tag`.
    fn get_simple(&self, tag: u16) -> Option<Vec<u8>>;
    /// Writes a fixed single-value record. Must be crash-consistent at
    /// the granularity of this single call.
    fn put_simple(&mut self, tag: u16, bytes: &[u8]) -> PutResult;

    /// Reads a generic, protocol-facing data object.
    fn get_data(&self, tag: u16) -> Option<Vec<u8>>;
    /// Writes a generic, protocol-facing data object.
    fn put_data(&mut self, tag: u16, bytes: &[u8]) -> PutResult;

    /// Total size in bytes of all DOs currently present, used to patch
    /// the SELECT-MF FCI template.
    fn total_do_bytes(&self) -> usize;

    /// Loads the stored private key for `purpose` and unwraps it under
    /// `(who, ks)`.
    fn load_prvkey(&self, purpose: Purpose, who: Credential, ks: &[u8; 20]) -> LoadKeyResult;

    /// Re-wraps the private key for `purpose` from `(who_old, ks_old)` to
    /// `(who_new, ks_new)` and persists it. Returns `Ok` if the key was
    /// absent (nothing to migrate) as well as on a successful migration
    /// -- callers distinguish those cases via `load_prvkey` first, per
    /// spec.md section 4.11.
    fn chks_prvkey(
        &mut self,
        purpose: Purpose,
        who_old: Credential,
        ks_old: &[u8; 20],
        who_new: Credential,
        ks_new: &[u8; 20],
    ) -> ChangeKeystringResult;

    /// True iff a wrapped key is present for `purpose`, irrespective of
    /// whether it can currently be unwrapped.
    fn has_prvkey(&self, purpose: Purpose) -> bool;

    /// Installs a private key, wrapped under `(who, ks)`. Used by tests
    /// and by the (unimplemented) key-generation path to seed fixtures.
    fn install_prvkey(
        &mut self,
        purpose: Purpose,
        who: Credential,
        ks: &[u8; 20],
        key: &RsaPrivateKey,
    ) -> PutResult;

    /// Reads back the public half of a stored key, DER-encoded as
    /// `SubjectPublicKeyInfo`. Public keys carry no confidentiality
    /// requirement, so this never touches a keystring (spec.md section
    /// 4.8, GENERATE ASYMMETRIC KEY PAIR's `P1 == 0x81` readback path).
    fn get_public_key_der(&self, purpose: Purpose) -> Option<Vec<u8>>;
}

struct WrappedKey {
    who: Credential,
    blob: Vec<u8>,
    public_der: Vec<u8>,
}

/// In-memory reference implementation. Not crash-safe -- that property
/// is the flash driver's job in a real token (spec.md section 5).
pub struct InMemoryDoStore {
    simple: HashMap<u16, Vec<u8>>,
    data: HashMap<u16, Vec<u8>>,
    keys: HashMap<Purpose, WrappedKey>,
}

impl Default for InMemoryDoStore {
    fn default() -> Self {
        InMemoryDoStore { simple: HashMap::new(), data: HashMap::new(), keys: HashMap::new() }
    }
}

impl InMemoryDoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DoStore for InMemoryDoStore {
    fn get_simple(&self, tag: u16) -> Option<Vec<u8>> {
        self.simple.get(&tag).cloned()
    }

    fn put_simple(&mut self, tag: u16, bytes: &[u8]) -> PutResult {
        self.simple.insert(tag, bytes.to_vec());
        PutResult::Ok
    }

    fn get_data(&self, tag: u16) -> Option<Vec<u8>> {
        self.data.get(&tag).cloned()
    }

    fn put_data(&mut self, tag: u16, bytes: &[u8]) -> PutResult {
        self.data.insert(tag, bytes.to_vec());
        PutResult::Ok
    }

    fn total_do_bytes(&self) -> usize {
        self.simple.values().map(|v| v.len()).sum::<usize>()
            + self.data.values().map(|v| v.len()).sum::<usize>()
            + self.keys.values().map(|k| k.blob.len() + k.public_der.len()).sum::<usize>()
    }

    fn load_prvkey(&self, purpose: Purpose, who: Credential, ks: &[u8; 20]) -> LoadKeyResult {
        let Some(wrapped) = self.keys.get(&purpose) else {
            return LoadKeyResult::Absent;
        };
        if wrapped.who != who {
            return LoadKeyResult::CryptoFail;
        }
        match crate::keywrap::unwrap_private_key(ks, &wrapped.blob) {
            Ok(key) => LoadKeyResult::Present(Box::new(key)),
            Err(_) => LoadKeyResult::CryptoFail,
        }
    }

    fn chks_prvkey(
        &mut self,
        purpose: Purpose,
        who_old: Credential,
        ks_old: &[u8; 20],
        who_new: Credential,
        ks_new: &[u8; 20],
    ) -> ChangeKeystringResult {
        let key = match self.load_prvkey(purpose, who_old, ks_old) {
            LoadKeyResult::Absent => return ChangeKeystringResult::Ok,
            LoadKeyResult::Present(k) => k,
            LoadKeyResult::CryptoFail => return ChangeKeystringResult::CryptoFail,
            LoadKeyResult::IoFail => return ChangeKeystringResult::IoFail,
        };
        let Ok(public_der) = key.to_public_key().to_public_key_der() else {
            return ChangeKeystringResult::IoFail;
        };
        match crate::keywrap::wrap_private_key(ks_new, &key) {
            Ok(blob) => {
                self.keys.insert(purpose, WrappedKey { who: who_new, blob, public_der: public_der.as_bytes().to_vec() });
                ChangeKeystringResult::Ok
            }
            Err(_) => ChangeKeystringResult::IoFail,
        }
    }

    fn has_prvkey(&self, purpose: Purpose) -> bool {
        self.keys.contains_key(&purpose)
    }

    fn install_prvkey(
        &mut self,
        purpose: Purpose,
        who: Credential,
        ks: &[u8; 20],
        key: &RsaPrivateKey,
    ) -> PutResult {
        let Ok(public_der) = key.to_public_key().to_public_key_der() else {
            return PutResult::IoFail;
        };
        match crate::keywrap::wrap_private_key(ks, key) {
            Ok(blob) => {
                self.keys.insert(purpose, WrappedKey { who, blob, public_der: public_der.as_bytes().to_vec() });
                PutResult::Ok
            }
            Err(_) => PutResult::IoFail,
        }
    }

    fn get_public_key_der(&self, purpose: Purpose) -> Option<Vec<u8>> {
        self.keys.get(&purpose).map(|k| k.public_der.clone())
    }
}
