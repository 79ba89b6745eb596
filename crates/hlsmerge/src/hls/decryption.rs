// HLS Decryption: IV handling and AES-128-CBC segment decryption.

use aes::Aes128;
use bytes::Bytes;
use cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7};

use crate::hls::HlsMergeError;

type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Parses an explicit IV from the playlist, with or without a `0x` prefix.
pub fn parse_iv(iv_hex_str: &str) -> Result<[u8; 16], HlsMergeError> {
    let trimmed = iv_hex_str.trim();
    let iv_str = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let mut iv_bytes = [0u8; 16];
    hex::decode_to_slice(iv_str, &mut iv_bytes).map_err(|e| HlsMergeError::IvDecodeError {
        iv: iv_hex_str.to_owned(),
        reason: e.to_string(),
    })?;
    Ok(iv_bytes)
}

/// Default IV when the key carries none: 15 zero bytes, then the low byte of
/// the segment index. Indices from 256 on wrap around, matching what the
/// encoder side does.
pub fn sequence_iv(index: usize) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[15] = (index & 0xff) as u8;
    iv
}

/// Decrypts one segment and strips its PKCS#7 padding.
pub fn decrypt_segment(
    index: usize,
    data: &[u8],
    key: &[u8],
    iv: &[u8; 16],
) -> Result<Bytes, HlsMergeError> {
    let cipher = Aes128CbcDec::new_from_slices(key, iv).map_err(|e| {
        HlsMergeError::DecryptionError {
            index,
            reason: format!("Failed to initialize AES decryptor (key is {} bytes): {e}", key.len()),
        }
    })?;

    let mut buffer = data.to_vec();
    let decrypted_len = cipher
        .decrypt_padded_mut::<Pkcs7>(&mut buffer)
        .map_err(|e| HlsMergeError::DecryptionError {
            index,
            reason: format!("Decryption failed: {e}"),
        })?
        .len();
    buffer.truncate(decrypted_len);

    Ok(Bytes::from(buffer))
}
