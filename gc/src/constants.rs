//! Shared constants used across the library.

/// Byte length of a wire label. The spec recommends `L >= 16`; 16 bytes
/// (128 bits) matches the teacher's original choice.
pub const LABEL_LEN: usize = 16;

/// Byte length of the authentication tag appended to every garbled-table
/// ciphertext by [`crate::cipher`].
pub const TAG_LEN: usize = 16;

/// Default bit length of the oblivious-transfer prime group. Adequate for
/// tests only; production deployments should raise this to 2048+ bits
/// (see spec.md §9, Open Question).
pub const DEFAULT_GROUP_BITS: u32 = 64;

/// Default TCP port the evaluator binds and the garbler connects to.
///
/// `original_source` uses ZeroMQ port `987654`, which does not fit in a
/// `u16` TCP port and is rescaled here.
pub const DEFAULT_PORT: u16 = 54_321;

/// Progress bar/spinner refresh cadence, in gates processed.
pub const PROGRESS_UPDATE_INTERVAL: u64 = 1000;
