//! Reference ripple-carry adder circuit generator.
//!
//! Reproduces the exact wire numbering and gate topology of
//! `original_source/src/util.py::generate_circuit` bit for bit, including
//! its closing block's somewhat unusual final-bit formula (an OR of two
//! ANDs gating the top bit's XOR against its sum and its raw `bob` input)
//! rather than a plain ripple carry-out. This implementation reproduces
//! that formula verbatim rather than simplifying it, since doing so would
//! silently change the circuit's output encoding.

use crate::circuit::{Circuit, Gate, GateType, WireId};

/// Build an `n`-bit two's-complement adder circuit. `n` must be at least 2;
/// the source's wire-numbering formula underflows for `n < 2`.
///
/// `alice`/`bob`/`out` wire-id lists are emitted most-significant-bit
/// first, matching the source's `[::-1]` reversal, so that an MSB-first
/// bit vector (as produced by [`crate::bits::to_bits`]) lines up directly
/// with the wire order.
pub fn build_adder_circuit(n: u32) -> Circuit {
    assert!(n >= 2, "adder circuit requires at least 2 input bits");

    let mut alice: Vec<WireId> = vec![1];
    let mut bob: Vec<WireId> = vec![2];
    let mut out: Vec<WireId> = vec![3];
    for i in 0..(n - 1) {
        alice.push(5 + 7 * i);
        bob.push(6 + 7 * i);
        out.push(8 + 7 * i);
    }
    out.push(9 + 7 * (n - 1));
    alice.reverse();
    bob.reverse();
    out.reverse();

    let mut gates = vec![
        Gate {
            id: 3,
            kind: GateType::Xor,
            inputs: vec![1, 2],
        },
        Gate {
            id: 4,
            kind: GateType::And,
            inputs: vec![1, 2],
        },
    ];

    for i in 0..(n - 1) {
        let a = 5 + 7 * i;
        let b = 6 + 7 * i;
        let cin = 4 + 7 * i;
        let xor1 = 7 + 7 * i;
        let sum = 8 + 7 * i;
        let and1 = 9 + 7 * i;
        let and2 = 10 + 7 * i;
        let carry = 11 + 7 * i;
        gates.push(Gate {
            id: xor1,
            kind: GateType::Xor,
            inputs: vec![a, b],
        });
        gates.push(Gate {
            id: sum,
            kind: GateType::Xor,
            inputs: vec![cin, xor1],
        });
        gates.push(Gate {
            id: and1,
            kind: GateType::And,
            inputs: vec![cin, xor1],
        });
        gates.push(Gate {
            id: and2,
            kind: GateType::And,
            inputs: vec![a, b],
        });
        gates.push(Gate {
            id: carry,
            kind: GateType::Or,
            inputs: vec![and1, and2],
        });
    }

    let top_xor = 5 + 7 * (n - 1);
    let top_sum = 1 + 7 * (n - 1);
    let top_a = 7 * (n - 1) - 2;
    let top_b = 7 * (n - 1) - 1;
    let closing_and = 6 + 7 * (n - 1);
    let closing_not = 7 + 7 * (n - 1);
    let closing_and2 = 8 + 7 * (n - 1);
    let closing_or = 9 + 7 * (n - 1);
    gates.push(Gate {
        id: top_xor,
        kind: GateType::Xor,
        inputs: vec![top_a, top_b],
    });
    gates.push(Gate {
        id: closing_and,
        kind: GateType::And,
        inputs: vec![top_xor, top_sum],
    });
    gates.push(Gate {
        id: closing_not,
        kind: GateType::Not,
        inputs: vec![top_xor],
    });
    gates.push(Gate {
        id: closing_and2,
        kind: GateType::And,
        inputs: vec![closing_not, top_b],
    });
    gates.push(Gate {
        id: closing_or,
        kind: GateType::Or,
        inputs: vec![closing_and, closing_and2],
    });

    Circuit {
        id: format!("{n}-bit adder"),
        alice,
        bob,
        out,
        gates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_bit_adder_matches_reference_wire_numbering() {
        let circuit = build_adder_circuit(2);
        assert_eq!(circuit.alice, vec![5, 1]);
        assert_eq!(circuit.bob, vec![6, 2]);
        assert_eq!(circuit.out, vec![16, 8, 3]);
        assert_eq!(circuit.gates.len(), 2 + 5 + 5);
    }

    #[test]
    fn three_bit_adder_matches_reference_wire_numbering() {
        let circuit = build_adder_circuit(3);
        assert_eq!(circuit.alice, vec![12, 5, 1]);
        assert_eq!(circuit.bob, vec![13, 6, 2]);
        assert_eq!(circuit.out, vec![23, 15, 8, 3]);
    }

    #[test]
    fn adder_circuits_validate() {
        for n in 2..=10 {
            build_adder_circuit(n)
                .validate()
                .unwrap_or_else(|e| panic!("n={n} circuit invalid: {e}"));
        }
    }
}
