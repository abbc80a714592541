//! AES Key Wrap (NIST SP800-38F, AES-KWP) for wrapping private keys at
//! rest under a keystring-derived key-encryption key.
//!
//! This is a straight adaptation of the Feistel-network construction
//! vendored into the teacher tree's `root-keys` crate (itself taken from
//! <https://github.com/jedisct1/rust-aes-keywrap>), parameterized on
//! AES-128 instead of AES-256: a keystring is a 20-byte SHA-1 digest
//! (spec.md section 3), and the key-encryption key is the first 16
//! bytes of that digest (see DESIGN.md's Open Question log for why
//! 16 rather than deriving a 32-byte KEK).

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;
use byteorder::{BigEndian, ByteOrder};
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::RsaPrivateKey;

const FEISTEL_ROUNDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywrapError {
    InvalidDataSize,
    AuthenticationFailed,
    DerCodec,
}

impl std::fmt::Display for KeywrapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeywrapError::InvalidDataSize => f.write_str("invalid wrapped-data size"),
            KeywrapError::AuthenticationFailed => f.write_str("key-wrap integrity check failed"),
            KeywrapError::DerCodec => f.write_str("private key DER encode/decode failed"),
        }
    }
}
impl std::error::Error for KeywrapError {}

struct Aes128KeyWrap {
    aes: Aes128,
}

impl Aes128KeyWrap {
    const MAC_BYTES: usize = 8;

    fn new(key: &[u8; 16]) -> Self {
        Aes128KeyWrap { aes: Aes128::new(key.into()) }
    }

    fn encapsulate(&self, input: &[u8]) -> Result<Vec<u8>, KeywrapError> {
        if input.len() > u32::MAX as usize {
            return Err(KeywrapError::InvalidDataSize);
        }
        let mut aiv: [u8; 8] = [0xa6, 0x59, 0x59, 0xa6, 0, 0, 0, 0];
        BigEndian::write_u32(&mut aiv[4..8], input.len() as u32);
        let mut block_storage = [0u8; 16];
        let mut block = GenericArray::from_mut_slice(&mut block_storage);
        block[0..8].copy_from_slice(&aiv);

        if input.len() == 8 {
            block[8..16].copy_from_slice(input);
            self.aes.encrypt_block(&mut block);
            return Ok(block.to_vec());
        }

        let mut counter = 0u64;
        let mut counter_bin = [0u8; 8];
        let mut output = vec![0u8; ((input.len() + 7) & !7) + Self::MAC_BYTES];
        output[8..][..input.len()].copy_from_slice(input);
        for _ in 0..FEISTEL_ROUNDS {
            let mut i = 8;
            while i <= (input.len() + 7) & !7 {
                block[8..16].copy_from_slice(&output[i..][0..8]);
                self.aes.encrypt_block(&mut block);
                counter += 1;
                BigEndian::write_u64(&mut counter_bin, counter);
                block[8..16].iter_mut().zip(counter_bin.iter()).for_each(|(a, b)| *a ^= b);
                output[i..i + 8].copy_from_slice(&block[8..16]);
                i += 8;
            }
        }
        output[0..8].copy_from_slice(&block[0..8]);
        Ok(output)
    }

    fn decapsulate(&self, input: &[u8]) -> Result<Vec<u8>, KeywrapError> {
        if input.len() % 8 != 0 || input.len() < 16 {
            return Err(KeywrapError::InvalidDataSize);
        }
        let output_len = input.len() - Self::MAC_BYTES;
        let mut output = vec![0u8; output_len];
        let mut block_storage = [0u8; 16];
        let mut block = GenericArray::from_mut_slice(&mut block_storage);

        if output.len() == 8 {
            block.copy_from_slice(input);
            self.aes.decrypt_block(&mut block);
            output[0..8].copy_from_slice(&block[8..16]);
            let (claimed_len, tag_ok) = check_aiv(&block[0..8]);
            if !tag_ok || claimed_len != 8 {
                return Err(KeywrapError::AuthenticationFailed);
            }
            return Ok(output);
        }

        output.copy_from_slice(&input[8..]);
        block[0..8].copy_from_slice(&input[0..8]);
        let mut counter = (FEISTEL_ROUNDS * output.len() / 8) as u64;
        let mut counter_bin = [0u8; 8];
        for _ in 0..FEISTEL_ROUNDS {
            let mut i = output.len();
            while i >= 8 {
                i -= 8;
                block[8..16].copy_from_slice(&output[i..][0..8]);
                BigEndian::write_u64(&mut counter_bin, counter);
                counter -= 1;
                block[8..16].iter_mut().zip(counter_bin.iter()).for_each(|(a, b)| *a ^= b);
                self.aes.decrypt_block(&mut block);
                output[i..][0..8].copy_from_slice(&block[8..16]);
            }
        }
        let (claimed_len, tag_ok) = check_aiv(&block[0..8]);
        if !tag_ok || claimed_len as usize > output.len() {
            return Err(KeywrapError::AuthenticationFailed);
        }
        output.truncate(claimed_len as usize);
        Ok(output)
    }
}

fn check_aiv(candidate: &[u8]) -> (u32, bool) {
    let prefix_ok = candidate[0] == 0xa6 && candidate[1] == 0x59 && candidate[2] == 0x59 && candidate[3] == 0xa6;
    (BigEndian::read_u32(&candidate[4..8]), prefix_ok)
}

fn kek_from_keystring(ks: &[u8; 20]) -> [u8; 16] {
    let mut kek = [0u8; 16];
    kek.copy_from_slice(&ks[..16]);
    kek
}

/// Serializes `key` as PKCS#8 DER and key-wraps it under `ks`.
pub fn wrap_private_key(ks: &[u8; 20], key: &RsaPrivateKey) -> Result<Vec<u8>, KeywrapError> {
    let der = key.to_pkcs8_der().map_err(|_| KeywrapError::DerCodec)?;
    let kw = Aes128KeyWrap::new(&kek_from_keystring(ks));
    kw.encapsulate(der.as_bytes())
}

/// Unwraps a blob produced by [`wrap_private_key`] and parses it back
/// into an `RsaPrivateKey`.
pub fn unwrap_private_key(ks: &[u8; 20], blob: &[u8]) -> Result<RsaPrivateKey, KeywrapError> {
    let kw = Aes128KeyWrap::new(&kek_from_keystring(ks));
    let der = kw.decapsulate(blob)?;
    RsaPrivateKey::from_pkcs8_der(&der).map_err(|_| KeywrapError::DerCodec)
}
