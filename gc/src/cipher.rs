//! Symmetric cell cipher for garbled-table entries.
//!
//! Wraps exactly one `(K_out || signal_bit)` payload per garbled-table cell
//! under a pair of wire-label keys. Builds on the teacher's `garbling_hash`
//! (SHA-256 keyed by concatenated label bytes) but adds the key-committing
//! tag the spec requires (§4.3): a decryptor supplied the wrong key pair
//! must detect it, with overwhelming probability, rather than silently
//! producing a wrong plaintext.

use sha2::{Digest, Sha256};

use crate::constants::TAG_LEN;

/// A fixed-length, key-committing ciphertext: `msg.len()` pad bytes plus a
/// `TAG_LEN`-byte authentication tag.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ciphertext(pub Vec<u8>);

/// Constant second key used for the single-key `NOT`-gate cell variant
/// (spec.md §4.4: "implementations may pass a fixed constant as the second
/// key").
pub const NOT_GATE_AUX_KEY: [u8; 1] = [0x4E]; // ASCII 'N'

fn hash_stream(parts: &[&[u8]], out_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(out_len);
    let mut counter: u32 = 0;
    while out.len() < out_len {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        hasher.update(counter.to_le_bytes());
        out.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    out.truncate(out_len);
    out
}

/// Length-matched KDF used both by the cell cipher's keystream and by the
/// oblivious-transfer subprotocol to derive a one-time pad from a group
/// element.
pub fn kdf(seed: &[u8], out_len: usize) -> Vec<u8> {
    hash_stream(&[seed], out_len)
}

/// Encrypt `msg` under the two keys `k1`, `k2`.
///
/// `pad = H(k1 || k2 || 0x00 || counter)`, `tag = H(k1 || k2 || 0x01)[..TAG_LEN]`.
pub fn encrypt(k1: &[u8], k2: &[u8], msg: &[u8]) -> Ciphertext {
    let pad = hash_stream(&[k1, k2, &[0x00]], msg.len());
    let tag = hash_stream(&[k1, k2, &[0x01]], TAG_LEN);
    let mut body: Vec<u8> = msg.iter().zip(pad.iter()).map(|(m, p)| m ^ p).collect();
    body.extend_from_slice(&tag);
    Ciphertext(body)
}

/// Decrypt `ct` under the two keys `k1`, `k2`.
///
/// Returns `None` (the spec's "⊥") when the recomputed tag does not match
/// the one embedded in the ciphertext, signalling that the wrong key pair
/// was supplied.
pub fn decrypt(k1: &[u8], k2: &[u8], ct: &Ciphertext) -> Option<Vec<u8>> {
    if ct.0.len() < TAG_LEN {
        return None;
    }
    let msg_len = ct.0.len() - TAG_LEN;
    let (body, tag) = ct.0.split_at(msg_len);
    let pad = hash_stream(&[k1, k2, &[0x00]], msg_len);
    let expected_tag = hash_stream(&[k1, k2, &[0x01]], TAG_LEN);
    if tag != expected_tag.as_slice() {
        return None;
    }
    Some(body.iter().zip(pad.iter()).map(|(c, p)| c ^ p).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_with_correct_keys() {
        let k1 = b"alice-key-0123456";
        let k2 = b"bob-key-012345678";
        let msg = b"a 17-byte label!!";
        let ct = encrypt(k1, k2, msg);
        assert_eq!(decrypt(k1, k2, &ct).unwrap(), msg);
    }

    #[test]
    fn wrong_keys_are_detected() {
        let k1 = b"alice-key-0123456";
        let k2 = b"bob-key-012345678";
        let wrong = b"not-the-right-key";
        let msg = b"super secret msg!";
        let ct = encrypt(k1, k2, msg);
        assert!(decrypt(wrong, k2, &ct).is_none());
        assert!(decrypt(k1, wrong, &ct).is_none());
    }

    #[test]
    fn ciphertext_length_matches_message_length() {
        let k1 = [1u8; 16];
        let k2 = [2u8; 16];
        let msg = [0u8; 17];
        let ct = encrypt(&k1, &k2, &msg);
        assert_eq!(ct.0.len(), msg.len() + TAG_LEN);
    }
}
