//! Test-only utilities for comparing plain and garbled circuit evaluation,
//! and for driving a garbler/evaluator session end to end over loopback TCP.

pub mod plain_evaluator;
pub mod session;
