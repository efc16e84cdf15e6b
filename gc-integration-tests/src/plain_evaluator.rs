//! Plaintext reference evaluator.
//!
//! Walks a [`gc::circuit::Circuit`] the same way [`gc::evaluator`] does
//! (topological gate order) but operates directly on `bool`s instead of
//! garbled labels, so it can serve as ground truth for the garbled
//! protocol's output.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use gc::circuit::{Circuit, WireId};

/// Evaluate `circuit` in the clear with the given input bits (covering both
/// `circuit.alice` and `circuit.bob`), returning the bit for every wire in
/// `circuit.out`.
pub fn evaluate_plain_circuit(
    circuit: &Circuit,
    inputs: &HashMap<WireId, bool>,
) -> Result<HashMap<WireId, bool>> {
    let mut values: HashMap<WireId, bool> = inputs.clone();
    let order = circuit
        .topological_gate_order()
        .context("circuit is not a valid DAG")?;
    let gate_by_id: HashMap<WireId, &gc::circuit::Gate> =
        circuit.gates.iter().map(|g| (g.id, g)).collect();

    for id in order {
        let gate = gate_by_id[&id];
        let a = *values
            .get(&gate.inputs[0])
            .with_context(|| format!("wire {} not yet computed", gate.inputs[0]))?;
        let out = if gate.kind.arity() == 1 {
            gate.kind.eval(a, a)
        } else {
            let b = *values
                .get(&gate.inputs[1])
                .with_context(|| format!("wire {} not yet computed", gate.inputs[1]))?;
            gate.kind.eval(a, b)
        };
        values.insert(gate.id, out);
    }

    let mut out = HashMap::with_capacity(circuit.out.len());
    for &wire in &circuit.out {
        let bit = *values
            .get(&wire)
            .ok_or_else(|| anyhow::anyhow!("output wire {wire} was never computed"))?;
        out.insert(wire, bit);
    }
    if out.len() != circuit.out.len() {
        bail!("duplicate output wire ids in circuit");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gc::adder::build_adder_circuit;
    use gc::bits::{from_bits, to_bits};

    fn wire_bits(wires: &[WireId], bits: &[bool]) -> HashMap<WireId, bool> {
        wires.iter().copied().zip(bits.iter().copied()).collect()
    }

    #[test]
    fn evaluates_single_xor_gate() {
        let circuit = Circuit {
            id: "xor".to_string(),
            alice: vec![1],
            bob: vec![2],
            out: vec![3],
            gates: vec![gc::circuit::Gate {
                id: 3,
                kind: gc::circuit::GateType::Xor,
                inputs: vec![1, 2],
            }],
        };
        let mut inputs = HashMap::new();
        inputs.insert(1, true);
        inputs.insert(2, true);
        let out = evaluate_plain_circuit(&circuit, &inputs).unwrap();
        assert_eq!(out[&3], false);
    }

    #[test]
    fn adder_matches_integer_addition() {
        let circuit = build_adder_circuit(8);
        for (a, b) in [(5i64, 7i64), (-1, 1), (127, -128), (-128, -1), (0, 0)] {
            let mut inputs = wire_bits(&circuit.alice, &to_bits(a, 8).unwrap());
            inputs.extend(wire_bits(&circuit.bob, &to_bits(b, 8).unwrap()));
            let out = evaluate_plain_circuit(&circuit, &inputs).unwrap();
            let ordered: Vec<bool> = circuit.out.iter().map(|w| out[w]).collect();
            assert_eq!(from_bits(&ordered), a + b);
        }
    }
}
