//! Two-party secure function evaluation via Yao's garbled-circuit protocol,
//! with 1-out-of-2 Diffie-Hellman oblivious transfer.
//!
//! Semi-honest only: no defense against malicious deviation, no peer
//! authentication, no circuit optimizations (free-XOR, half-gates, row
//! reduction), no timing-side-channel hardening, no transcript persistence.

pub mod adder;
pub mod bits;
pub mod cipher;
pub mod circuit;
pub mod constants;
pub mod error;
pub mod evaluator;
pub mod garbler;
pub mod message;
pub mod ot;
pub mod primegroup;
pub mod protocol;
pub mod transport;

pub use error::GcError;
