//! AES-256-CBC payload encryption (platform "safe mode").
//!
//! Plaintext frame, before padding:
//!
//! ```text
//! | random (16) | xml length, big-endian (4) | xml | app id |
//! ```
//!
//! The frame is PKCS#7 padded to a 32-byte boundary and encrypted with the
//! 32-byte account key. The IV is the first 16 bytes of that key.

use base64::alphabet;
use base64::engine::{general_purpose, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::error::{DecryptError, Result, WebhookError};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Block size the platform pads to. Larger than the AES block.
const PAD_BLOCK: usize = 32;

/// Width of the random prefix in the plaintext frame.
pub const RANDOM_LEN: usize = 16;

/// Width of the big-endian xml length field.
pub const LENGTH_LEN: usize = 4;

const KEY_LEN: usize = 32;
const ENCODED_KEY_LEN: usize = 43;

/// The account keys are random, so the final base64 character may carry
/// non-zero trailing bits that the strict engine would reject.
const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decoded account encryption key.
#[derive(Clone, PartialEq, Eq)]
pub struct AesKey([u8; KEY_LEN]);

impl AesKey {
    /// Parse the 43-character `EncodingAESKey` from the platform console.
    pub fn from_encoded(encoded: &str) -> Result<Self, DecryptError> {
        let encoded = encoded.trim();
        if encoded.len() != ENCODED_KEY_LEN {
            return Err(DecryptError::BadKey);
        }
        let bytes = KEY_ENGINE
            .decode(format!("{}=", encoded))
            .map_err(|_| DecryptError::BadKey)?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| DecryptError::BadKey)?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn iv(&self) -> &[u8] {
        &self.0[..BLOCK_SIZE]
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesKey(..)")
    }
}

/// Base64-decode and decrypt an `Encrypt` field, returning the unpadded
/// plaintext frame.
pub fn decrypt(ciphertext: &str, key: &AesKey) -> Result<Vec<u8>, DecryptError> {
    let data = general_purpose::STANDARD
        .decode(ciphertext.trim())
        .map_err(|_| DecryptError::BadEncoding)?;

    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(DecryptError::BadBlockAlignment);
    }

    let plain = Aes256CbcDec::new_from_slices(key.as_bytes(), key.iv())
        .map_err(|_| DecryptError::BadKey)?
        .decrypt_padded_vec_mut::<NoPadding>(&data)
        .map_err(|_| DecryptError::BadPadding)?;

    strip_padding(plain)
}

/// Encrypt a plaintext frame and base64-encode it.
pub fn encrypt(plaintext: &[u8], key: &AesKey) -> Result<String, DecryptError> {
    let mut padded = plaintext.to_vec();
    let pad = PAD_BLOCK - plaintext.len() % PAD_BLOCK;
    padded.resize(plaintext.len() + pad, pad as u8);

    let data = cbc_encrypt(&padded, key)?;
    Ok(general_purpose::STANDARD.encode(data))
}

fn cbc_encrypt(aligned: &[u8], key: &AesKey) -> Result<Vec<u8>, DecryptError> {
    Ok(Aes256CbcEnc::new_from_slices(key.as_bytes(), key.iv())
        .map_err(|_| DecryptError::BadKey)?
        .encrypt_padded_vec_mut::<NoPadding>(aligned))
}

fn strip_padding(mut plain: Vec<u8>) -> Result<Vec<u8>, DecryptError> {
    let pad = match plain.last() {
        Some(&p) => p as usize,
        None => return Err(DecryptError::BadPadding),
    };
    if pad == 0 || pad > PAD_BLOCK || pad > plain.len() {
        return Err(DecryptError::BadPadding);
    }
    if plain[plain.len() - pad..].iter().any(|&b| b as usize != pad) {
        return Err(DecryptError::BadPadding);
    }
    plain.truncate(plain.len() - pad);
    Ok(plain)
}

/// Build the plaintext frame for `xml`, sealed for `app_id`.
pub fn frame(xml: &[u8], app_id: &str, random: [u8; RANDOM_LEN]) -> Vec<u8> {
    let mut out = Vec::with_capacity(RANDOM_LEN + LENGTH_LEN + xml.len() + app_id.len());
    out.extend_from_slice(&random);
    out.extend_from_slice(&(xml.len() as u32).to_be_bytes());
    out.extend_from_slice(xml);
    out.extend_from_slice(app_id.as_bytes());
    out
}

/// Read the message XML out of a decrypted frame and check that the trailing
/// app id is exactly `expected_app_id`.
pub fn extract_and_validate<'a>(plaintext: &'a [u8], expected_app_id: &str) -> Result<&'a [u8]> {
    let header = RANDOM_LEN + LENGTH_LEN;
    if plaintext.len() < header {
        return Err(DecryptError::Truncated.into());
    }

    let mut len_bytes = [0u8; LENGTH_LEN];
    len_bytes.copy_from_slice(&plaintext[RANDOM_LEN..header]);
    let length = u32::from_be_bytes(len_bytes) as usize;

    let end = header
        .checked_add(length)
        .filter(|&end| end <= plaintext.len())
        .ok_or(DecryptError::Truncated)?;

    let xml = &plaintext[header..end];
    let app_id = &plaintext[end..];
    if app_id != expected_app_id.as_bytes() {
        let found = String::from_utf8_lossy(app_id).into_owned();
        tracing::error!(
            expected = expected_app_id,
            found = %found,
            "decrypted payload belongs to a different app id"
        );
        return Err(WebhookError::TenantMismatch {
            expected: expected_app_id.to_string(),
            found,
        });
    }
    Ok(xml)
}

/// Frame `xml` for `app_id` with a fresh random prefix and encrypt it.
pub fn seal(xml: &[u8], app_id: &str, key: &AesKey) -> Result<String> {
    let mut random = [0u8; RANDOM_LEN];
    getrandom::getrandom(&mut random)
        .map_err(|e| WebhookError::Encode(format!("random prefix: {}", e)))?;
    Ok(encrypt(&frame(xml, app_id, random), key)?)
}
