//! Crate-wide error type.
//!
//! The library surfaces a small, closed set of error kinds so that callers
//! (in particular the CLI) can map failures onto the exit codes of the
//! protocol: `0` success, `1` protocol abort, `2` input error.

use thiserror::Error;

/// Errors produced by the garbled-circuit engine, the OT subprotocol and the
/// message transport.
#[derive(Debug, Error)]
pub enum GcError {
    /// An input integer does not fit in the declared two's-complement width.
    #[error("value {value} does not fit in {width}-bit two's complement")]
    InputOverflow {
        /// The offending value.
        value: i64,
        /// The declared width, in bits.
        width: u32,
    },

    /// Two byte buffers that must line up (e.g. for XOR) have different lengths.
    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch {
        /// Length of the left-hand buffer.
        left: usize,
        /// Length of the right-hand buffer.
        right: usize,
    },

    /// The circuit JSON violates one of the structural invariants of §3.
    #[error("malformed circuit: {0}")]
    CircuitMalformed(String),

    /// The oblivious-transfer subprotocol detected tampering or a
    /// malformed group element.
    #[error("oblivious transfer protocol error: {0}")]
    OtProtocolError(String),

    /// A garbled-table cell failed to decrypt under the key pair selected
    /// by the evaluator's signal bits.
    #[error("garbled table corrupt at wire {wire}")]
    GarbledTableCorrupt {
        /// The gate/output wire whose table failed to decrypt.
        wire: u32,
    },

    /// The message transport failed (peer disconnect, timeout, malformed frame).
    #[error("transport error: {0}")]
    TransportError(String),
}

impl GcError {
    /// Maps an error onto the process exit code specified in §7 of the spec:
    /// `1` for protocol aborts, `2` for input errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            GcError::InputOverflow { .. } | GcError::CircuitMalformed(_) => 2,
            GcError::OtProtocolError(_)
            | GcError::GarbledTableCorrupt { .. }
            | GcError::TransportError(_)
            | GcError::LengthMismatch { .. } => 1,
        }
    }
}
