//! MEGA file keys: attribute decryption and the content keystream.

use aes::Aes128;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use serde::Deserialize;

use super::MegaError;

type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Stream cipher applied to downloaded file content.
pub(crate) type ContentCipher = ctr::Ctr128BE<Aes128>;

const BLOCK_LEN: usize = 16;
const ATTRIBUTE_MAGIC: &str = "MEGA";

/// Decrypted node attributes. Only the name is used.
#[derive(Debug, Deserialize)]
pub(crate) struct Attributes {
    #[serde(rename = "n")]
    pub(crate) name: String,
}

/// A file key split into its AES key and CTR nonce.
#[derive(Clone)]
pub(crate) struct FileKey {
    aes: [u8; 16],
    nonce: [u8; 8],
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FileKey([REDACTED])")
    }
}

impl FileKey {
    /// Decode the 256-bit key carried in a link and fold it into a 128-bit
    /// AES key (`k[i] ^ k[i + 16]`) plus the nonce at `k[16..24]`.
    pub(crate) fn from_link_key(encoded: &str) -> Result<Self, MegaError> {
        let raw = decode_base64(encoded).map_err(|e| MegaError::InvalidKey(e.to_string()))?;
        if raw.len() != 32 {
            return Err(MegaError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                raw.len()
            )));
        }
        let (low, high) = raw.split_at(16);

        let mut aes = [0u8; 16];
        for (out, (a, b)) in aes.iter_mut().zip(low.iter().zip(high)) {
            *out = a ^ b;
        }
        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(&high[..8]);

        Ok(Self { aes, nonce })
    }

    /// Decrypt the base64 `at` field of a node (AES-128-CBC, zero IV).
    pub(crate) fn decrypt_attributes(&self, encoded: &str) -> Result<Attributes, MegaError> {
        let mut buf =
            decode_base64(encoded).map_err(|e| MegaError::BadAttributes(e.to_string()))?;
        if buf.is_empty() || !buf.len().is_multiple_of(BLOCK_LEN) {
            return Err(MegaError::BadAttributes(format!(
                "ciphertext length {} is not a positive multiple of {BLOCK_LEN}",
                buf.len()
            )));
        }

        let decryptor = Aes128CbcDec::new_from_slices(&self.aes, &[0u8; BLOCK_LEN])
            .map_err(|e| MegaError::BadAttributes(e.to_string()))?;
        let plain = decryptor
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .map_err(|e| MegaError::BadAttributes(e.to_string()))?;

        let text = std::str::from_utf8(plain)
            .map_err(|_| MegaError::BadAttributes("not valid UTF-8; wrong key?".to_owned()))?;
        let json = text
            .strip_prefix(ATTRIBUTE_MAGIC)
            .ok_or_else(|| MegaError::BadAttributes("missing MEGA prefix; wrong key?".to_owned()))?
            .trim_end_matches('\0');

        serde_json::from_str(json).map_err(|e| MegaError::BadAttributes(e.to_string()))
    }

    /// Keystream for the file body, starting at offset zero.
    pub(crate) fn content_cipher(&self) -> ContentCipher {
        let mut iv = [0u8; BLOCK_LEN];
        iv[..8].copy_from_slice(&self.nonce);
        ContentCipher::new(&self.aes.into(), &iv.into())
    }
}

/// Decode MEGA's base64 dialect: URL-safe alphabet, padding optional.
pub(crate) fn decode_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let normalized: String = input
        .trim()
        .chars()
        .filter(|c| *c != '=')
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_NO_PAD.decode(normalized)
}

/// Make a decrypted node name safe to use as a single path component.
pub(crate) fn sanitize_file_name(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .filter(|c| *c != '\0')
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().to_owned();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use cbc::cipher::BlockEncryptMut;
    use ctr::cipher::StreamCipher;

    type Aes128CbcEnc = cbc::Encryptor<Aes128>;

    pub(crate) const LINK_KEY: [u8; 32] = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
        0x10, 0xa0, 0xa1, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xab, 0xac, 0xad,
        0xae, 0xaf,
    ];

    pub(crate) fn encoded_link_key() -> String {
        URL_SAFE_NO_PAD.encode(LINK_KEY)
    }

    /// Encrypt an attribute blob the way MEGA stores it.
    pub(crate) fn encrypt_attributes(key: &FileKey, json: &str) -> String {
        let mut buf = format!("{ATTRIBUTE_MAGIC}{json}").into_bytes();
        while !buf.len().is_multiple_of(BLOCK_LEN) {
            buf.push(0);
        }
        let len = buf.len();
        let encryptor = Aes128CbcEnc::new_from_slices(&key.aes, &[0u8; BLOCK_LEN]).unwrap();
        encryptor
            .encrypt_padded_mut::<NoPadding>(&mut buf, len)
            .unwrap();
        URL_SAFE_NO_PAD.encode(buf)
    }

    #[test]
    fn folds_link_key() {
        let key = FileKey::from_link_key(&encoded_link_key()).unwrap();
        assert_eq!(key.aes[0], 0x01 ^ 0xa0);
        assert_eq!(key.aes[15], 0x10 ^ 0xaf);
        assert_eq!(key.nonce, [0xa0, 0xa1, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7]);
    }

    #[test]
    fn rejects_short_keys() {
        let short = URL_SAFE_NO_PAD.encode([0u8; 16]);
        assert!(matches!(
            FileKey::from_link_key(&short),
            Err(MegaError::InvalidKey(_))
        ));
        assert!(FileKey::from_link_key("!!!").is_err());
    }

    #[test]
    fn decrypts_attributes() {
        let key = FileKey::from_link_key(&encoded_link_key()).unwrap();
        let at = encrypt_attributes(&key, r#"{"n":"movie.mkv","c":"xyz"}"#);
        assert_eq!(key.decrypt_attributes(&at).unwrap().name, "movie.mkv");
    }

    #[test]
    fn wrong_key_fails_attribute_decryption() {
        let key = FileKey::from_link_key(&encoded_link_key()).unwrap();
        let at = encrypt_attributes(&key, r#"{"n":"movie.mkv"}"#);
        let other = FileKey::from_link_key(&URL_SAFE_NO_PAD.encode([7u8; 32])).unwrap();
        assert!(matches!(
            other.decrypt_attributes(&at),
            Err(MegaError::BadAttributes(_))
        ));
    }

    #[test]
    fn rejects_truncated_attributes() {
        let key = FileKey::from_link_key(&encoded_link_key()).unwrap();
        assert!(key.decrypt_attributes(&URL_SAFE_NO_PAD.encode([1u8; 10])).is_err());
        assert!(key.decrypt_attributes("").is_err());
    }

    #[test]
    fn content_cipher_round_trips() {
        let key = FileKey::from_link_key(&encoded_link_key()).unwrap();
        let original = b"the quick brown fox jumps over the lazy dog".to_vec();
        let mut data = original.clone();
        key.content_cipher().apply_keystream(&mut data);
        assert_ne!(data, original);

        // Decrypting in uneven chunks matches one pass.
        let mut cipher = key.content_cipher();
        let (a, b) = data.split_at_mut(7);
        cipher.apply_keystream(a);
        cipher.apply_keystream(b);
        assert_eq!(data, original);
    }

    #[test]
    fn base64_dialects() {
        assert_eq!(decode_base64("-_8").unwrap(), decode_base64("+/8=").unwrap());
        assert_eq!(decode_base64(" AQID ").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_file_name("a/b\\c.txt").as_deref(), Some("a_b_c.txt"));
        assert_eq!(sanitize_file_name("  ok.bin ").as_deref(), Some("ok.bin"));
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("\0"), None);
    }

    #[test]
    fn debug_redacts_key() {
        let key = FileKey::from_link_key(&encoded_link_key()).unwrap();
        assert_eq!(format!("{key:?}"), "FileKey([REDACTED])");
    }
}
