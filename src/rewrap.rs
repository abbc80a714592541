//! `gpg_change_keystring`: re-wraps the three private keys from one
//! credential/keystring pair to another. Shared by CHANGE REFERENCE DATA
//! and RESET RETRY COUNTER (spec.md section 4.11).

use crate::acs::Credential;
use crate::do_store::{ChangeKeystringResult, DoStore, Purpose};

/// Replaces the original firmware's `<0 / <-2 / >=0` integer convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewrapOutcome {
    /// Count of keys that were present and successfully re-wrapped. Zero
    /// means no keys needed migrating.
    Migrated(usize),
    /// Unwrap failed cryptographically for a key that was present.
    CryptoFail,
    /// A re-wrapped key failed to persist.
    IoFail,
}

pub fn gpg_change_keystring(
    store: &mut dyn DoStore,
    who_old: Credential,
    ks_old: &[u8; 20],
    who_new: Credential,
    ks_new: &[u8; 20],
) -> RewrapOutcome {
    let mut migrated = 0usize;
    for purpose in Purpose::ALL {
        let was_present = store.has_prvkey(purpose);
        match store.chks_prvkey(purpose, who_old, ks_old, who_new, ks_new) {
            ChangeKeystringResult::Ok => {
                if was_present {
                    migrated += 1;
                }
            }
            ChangeKeystringResult::CryptoFail => return RewrapOutcome::CryptoFail,
            ChangeKeystringResult::IoFail => return RewrapOutcome::IoFail,
        }
    }
    RewrapOutcome::Migrated(migrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::do_store::InMemoryDoStore;
    use rand::rngs::OsRng;
    use rsa::RsaPrivateKey;

    #[test]
    fn no_keys_present_migrates_zero() {
        let mut store = InMemoryDoStore::new();
        let outcome = gpg_change_keystring(&mut store, Credential::User, &[1u8; 20], Credential::User, &[2u8; 20]);
        assert_eq!(outcome, RewrapOutcome::Migrated(0));
    }

    #[test]
    fn present_keys_migrate_and_persist_under_new_keystring() {
        let mut store = InMemoryDoStore::new();
        let key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let old_ks = [1u8; 20];
        let new_ks = [2u8; 20];
        store.install_prvkey(Purpose::Signing, Credential::User, &old_ks, &key);

        let outcome = gpg_change_keystring(&mut store, Credential::User, &old_ks, Credential::User, &new_ks);
        assert_eq!(outcome, RewrapOutcome::Migrated(1));

        use crate::do_store::LoadKeyResult;
        assert!(matches!(store.load_prvkey(Purpose::Signing, Credential::User, &old_ks), LoadKeyResult::CryptoFail));
        assert!(matches!(store.load_prvkey(Purpose::Signing, Credential::User, &new_ks), LoadKeyResult::Present(_)));
    }

    #[test]
    fn wrong_old_keystring_is_crypto_fail() {
        let mut store = InMemoryDoStore::new();
        let key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        store.install_prvkey(Purpose::Decryption, Credential::User, &[1u8; 20], &key);
        let outcome = gpg_change_keystring(&mut store, Credential::User, &[9u8; 20], Credential::User, &[2u8; 20]);
        assert_eq!(outcome, RewrapOutcome::CryptoFail);
    }
}
