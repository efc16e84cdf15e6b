//! 1-out-of-2 oblivious transfer over a prime-order group, plus the
//! explicit insecure passthrough used by the `--no-oblivious-transfer` test
//! mode (spec.md §9 Non-goals: the passthrough is a test aid, never secure).
//!
//! The protocol is the textbook Diffie-Hellman "simplest OT": the sender
//! publishes a group and a random public key `c`; the chooser splits `c`
//! into a pair `(h0, h1)` with `h0 * h1 = c`, knowing the discrete log of
//! only the one corresponding to its choice bit; the sender then masks each
//! of its two messages under the two possible shared secrets, and the
//! chooser can only recover the mask it has the exponent for.

use num_bigint::BigUint;
use num_traits::One;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::bits::xor_bytes;
use crate::cipher::kdf;
use crate::constants::LABEL_LEN;
use crate::error::GcError;
use crate::primegroup::PrimeGroup;

/// Wire message published by the sender: the group and sender's public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtSetup {
    #[serde(with = "biguint_bytes")]
    pub p: BigUint,
    #[serde(with = "biguint_bytes")]
    pub g: BigUint,
    #[serde(with = "biguint_bytes")]
    pub c: BigUint,
}

/// Wire message from the chooser: a split of the sender's public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtChoice {
    #[serde(with = "biguint_bytes")]
    pub h0: BigUint,
    #[serde(with = "biguint_bytes")]
    pub h1: BigUint,
}

/// Wire message from the sender: one masked message per choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtReply {
    #[serde(with = "biguint_bytes")]
    pub u0: BigUint,
    #[serde(with = "biguint_bytes")]
    pub u1: BigUint,
    pub e0: Vec<u8>,
    pub e1: Vec<u8>,
}

mod biguint_bytes {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        v.to_bytes_be().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        let bytes = Vec::<u8>::deserialize(d)?;
        Ok(BigUint::from_bytes_be(&bytes))
    }
}

/// The sender's (garbler's) half of the protocol, holding the private
/// exponent behind its published public key across the two round trips.
#[derive(Debug)]
pub struct OtSender {
    group: PrimeGroup,
    private_c: BigUint,
}

impl OtSender {
    /// Generate a fresh group and public key, returning the setup message
    /// to publish to the chooser.
    pub fn new<R: RngCore>(group_bits: u32, rng: &mut R) -> (Self, OtSetup) {
        let group = PrimeGroup::generate(group_bits, rng);
        let private_c = group.rand_elt(rng);
        let c = group.gen_pow(&private_c);
        let setup = OtSetup {
            p: group.prime().clone(),
            g: group.generator().clone(),
            c,
        };
        (
            OtSender {
                group,
                private_c,
            },
            setup,
        )
    }

    /// Given the chooser's split `(h0, h1)`, mask `m0` under `h0` and `m1`
    /// under `h1`, returning the reply message. `m0`/`m1` must have equal
    /// length (normally `LABEL_LEN`).
    pub fn reply<R: RngCore>(
        &self,
        choice: &OtChoice,
        m0: &[u8],
        m1: &[u8],
        rng: &mut R,
    ) -> Result<OtReply, GcError> {
        if m0.len() != m1.len() {
            return Err(GcError::LengthMismatch {
                left: m0.len(),
                right: m1.len(),
            });
        }
        if !self.group.contains(&choice.h0) || !self.group.contains(&choice.h1) {
            return Err(GcError::OtProtocolError(
                "chooser's split is not a valid group element".to_string(),
            ));
        }
        let expected_c = self.group.mul(&choice.h0, &choice.h1);
        let c = self.group.gen_pow(&self.private_c);
        if expected_c != c {
            return Err(GcError::OtProtocolError(
                "chooser's split does not reconstruct the published key".to_string(),
            ));
        }

        let r0 = self.group.rand_elt(rng);
        let r1 = self.group.rand_elt(rng);
        let u0 = self.group.gen_pow(&r0);
        let u1 = self.group.gen_pow(&r1);
        let shared0 = self.group.pow(&choice.h0, &r0);
        let shared1 = self.group.pow(&choice.h1, &r1);
        let pad0 = kdf(&shared0.to_bytes_be(), m0.len());
        let pad1 = kdf(&shared1.to_bytes_be(), m1.len());
        Ok(OtReply {
            u0,
            u1,
            e0: xor_bytes(m0, &pad0)?,
            e1: xor_bytes(m1, &pad1)?,
        })
    }
}

/// The chooser's (evaluator's) half of the protocol, holding the exponent
/// behind whichever share corresponds to its choice bit.
#[derive(Debug)]
pub struct OtChooser {
    group: PrimeGroup,
    choice_bit: bool,
    k: BigUint,
}

impl OtChooser {
    /// Given the sender's published setup and a choice bit, generate the
    /// split to send back.
    pub fn new<R: RngCore>(setup: &OtSetup, choice_bit: bool, rng: &mut R) -> (Self, OtChoice) {
        // The sender's generator is taken as-is rather than re-derived, so
        // both sides of the protocol agree on the same group.
        let group = PrimeGroup::from_parts(setup.p.clone(), setup.g.clone());
        let k = group.rand_elt(rng);
        let h_chosen = group.gen_pow(&k);
        let h_other = group.mul(&setup.c, &group.inv(&h_chosen));
        let (h0, h1) = if choice_bit {
            (h_other, h_chosen.clone())
        } else {
            (h_chosen.clone(), h_other)
        };
        (
            OtChooser {
                group,
                choice_bit,
                k,
            },
            OtChoice { h0, h1 },
        )
    }

    /// Recover the chosen message from the sender's reply.
    pub fn recover(&self, reply: &OtReply) -> Vec<u8> {
        let (u, e) = if self.choice_bit {
            (&reply.u1, &reply.e1)
        } else {
            (&reply.u0, &reply.e0)
        };
        let shared = self.group.pow(u, &self.k);
        let pad = kdf(&shared.to_bytes_be(), e.len());
        // `xor_bytes` cannot fail here: `pad` is generated to `e.len()`.
        xor_bytes(e, &pad).expect("pad length matches ciphertext length by construction")
    }
}

/// The insecure OT-disabled mode (spec.md §9): the chooser's bit is sent in
/// the clear and the sender returns the matching message directly, with no
/// cryptographic hiding whatsoever. Exists purely to make semi-honest,
/// oblivious-transfer-free test runs fast and deterministic.
#[derive(Debug)]
pub struct PassthroughOt;

impl PassthroughOt {
    /// Sender side: given the chooser's plaintext bit, return the message
    /// it selects.
    pub fn select(choice_bit: bool, m0: &[u8], m1: &[u8]) -> Vec<u8> {
        if choice_bit {
            m1.to_vec()
        } else {
            m0.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn ot_recovers_exactly_the_chosen_message() {
        let mut rng = ChaCha12Rng::seed_from_u64(42);
        let (sender, setup) = OtSender::new(64, &mut rng);

        for choice_bit in [false, true] {
            let (chooser, choice) = OtChooser::new(&setup, choice_bit, &mut rng);
            let m0 = [0xAAu8; LABEL_LEN];
            let m1 = [0x55u8; LABEL_LEN];
            let reply = sender.reply(&choice, &m0, &m1, &mut rng).unwrap();
            let recovered = chooser.recover(&reply);
            let expected = if choice_bit { m1 } else { m0 };
            assert_eq!(recovered, expected);
        }
    }

    #[test]
    fn passthrough_selects_requested_message() {
        let m0 = b"label-zero-bytes";
        let m1 = b"label-one--bytes";
        assert_eq!(PassthroughOt::select(false, m0, m1), m0);
        assert_eq!(PassthroughOt::select(true, m0, m1), m1);
    }

    #[test]
    fn tampered_choice_is_rejected() {
        let mut rng = ChaCha12Rng::seed_from_u64(43);
        let (sender, setup) = OtSender::new(64, &mut rng);
        let bad_choice = OtChoice {
            h0: BigUint::one(),
            h1: BigUint::one(),
        };
        let m0 = [0u8; LABEL_LEN];
        let m1 = [1u8; LABEL_LEN];
        assert!(sender.reply(&bad_choice, &m0, &m1, &mut rng).is_err());
    }
}
