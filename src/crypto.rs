//! Crypto bindings the core orchestrates but does not implement itself:
//! SHA-1 keystring derivation and RSA sign/decrypt. The RSA primitive
//! and SHA-1 are named external interfaces per spec.md sections 1 and 6
//! -- this module is the trait boundary plus one concrete backend built
//! from the `rsa`/`sha1` crates already present in the retrieved corpus
//! (`dirkz-sequoia`, and the ICAO 9303 reader in `other_examples`).

use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey};
use sha1::{Digest, Sha1};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    SignFailed,
    DecryptFailed,
}

/// The crypto interface consumed by the handlers (spec.md section 6).
/// Kept as a trait, rather than free functions, so tests can swap in a
/// fault-injecting backend without touching the dispatcher.
pub trait CryptoBackend {
    fn sha1(&self, buf: &[u8]) -> [u8; 20];
    fn rsa_sign(&self, key: &RsaPrivateKey, digest_info: &[u8]) -> Result<Vec<u8>, CryptoError>;
    fn rsa_decrypt(&self, key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// The production backend: PKCS#1 v1.5 sign/decrypt via the `rsa` crate,
/// SHA-1 via the `sha1` crate. SHA-1 is mandated by the OpenPGP Card v2
/// keystring derivation -- it is a spec requirement, not a security
/// choice, and this module does not silently upgrade it (spec.md
/// section 9).
#[derive(Debug, Default, Clone, Copy)]
pub struct RsaSha1Backend;

impl CryptoBackend for RsaSha1Backend {
    fn sha1(&self, buf: &[u8]) -> [u8; 20] {
        let mut hasher = Sha1::new();
        hasher.update(buf);
        hasher.finalize().into()
    }

    fn rsa_sign(&self, key: &RsaPrivateKey, digest_info: &[u8]) -> Result<Vec<u8>, CryptoError> {
        key.sign(Pkcs1v15Sign::new_unprefixed(), digest_info).map_err(|_| CryptoError::SignFailed)
    }

    fn rsa_decrypt(&self, key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        key.decrypt(Pkcs1v15Encrypt, ciphertext).map_err(|_| CryptoError::DecryptFailed)
    }
}
