//! Garbling: wire label generation, point-and-permute signal bits and
//! per-gate garbled table construction.
//!
//! Structurally this follows the teacher's `garbler.rs` (`WireLabel`,
//! `WireLabels`, a `garbling_hash` keyed PRF, one garbled table per gate) but
//! replaces the free-XOR optimization — `label_1 = label_0 XOR delta` — with
//! independently random label pairs plus an explicit point-and-permute
//! signal bit per wire, since free-XOR is an out-of-scope circuit
//! optimization (spec.md §9 Non-goals).

use std::collections::HashMap;

use indicatif::{ProgressBar, ProgressStyle};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::cipher::{self, Ciphertext, NOT_GATE_AUX_KEY};
use crate::circuit::{Circuit, GateType, WireId};
use crate::constants::{LABEL_LEN, PROGRESS_UPDATE_INTERVAL};

/// A single wire label: `LABEL_LEN` uniform random bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireLabel(pub [u8; LABEL_LEN]);

impl WireLabel {
    /// Draw a fresh uniform random label.
    pub fn random<R: RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; LABEL_LEN];
        rng.fill_bytes(&mut bytes);
        WireLabel(bytes)
    }

    /// Borrow the label's bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The pair of labels assigned to one wire, `(label for 0, label for 1)`,
/// together with the point-and-permute signal bit attached to `label0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WireKeyPair {
    pub label0: WireLabel,
    pub label1: WireLabel,
    /// Signal (point-and-permute) bit of `label0`. `label1`'s signal bit is
    /// always the complement, so a garbled-table row index can be recovered
    /// from a label alone without revealing which value it encodes.
    pub pbit0: bool,
}

impl WireKeyPair {
    fn random<R: RngCore>(rng: &mut R) -> Self {
        WireKeyPair {
            label0: WireLabel::random(rng),
            label1: WireLabel::random(rng),
            pbit0: rng.next_u32() & 1 == 1,
        }
    }

    /// The label and its signal bit, for a given plaintext bit.
    pub fn label_for(&self, bit: bool) -> (WireLabel, bool) {
        if bit {
            (self.label1, !self.pbit0)
        } else {
            (self.label0, self.pbit0)
        }
    }
}

/// One gate's garbled table, keyed by the two (or one) input signal bits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GarbledTable {
    /// A two-input gate: four rows, indexed `[pbit_a][pbit_b]`.
    TwoInput([[Ciphertext; 2]; 2]),
    /// A `NOT` gate: two rows, indexed `[pbit_a]`.
    OneInput([Ciphertext; 2]),
}

/// Everything the garbler produces for one circuit: the keys for every
/// wire, and one garbled table per gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarbledCircuit {
    pub keys: HashMap<WireId, WireKeyPair>,
    pub tables: HashMap<WireId, GarbledTable>,
}

/// Garble every gate of `circuit`, drawing fresh random labels and signal
/// bits for every wire (circuit inputs and gate outputs alike).
pub fn garble_circuit<R: RngCore>(circuit: &Circuit, rng: &mut R) -> GarbledCircuit {
    let mut keys: HashMap<WireId, WireKeyPair> = HashMap::new();
    for &wire in &circuit.all_wire_ids() {
        keys.insert(wire, WireKeyPair::random(rng));
    }

    let order = circuit
        .topological_gate_order()
        .expect("circuit was validated before garbling");
    let gate_by_id: HashMap<WireId, &crate::circuit::Gate> =
        circuit.gates.iter().map(|g| (g.id, g)).collect();

    let pb = ProgressBar::new(circuit.gates.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("garbling circuit");

    let mut tables = HashMap::with_capacity(circuit.gates.len());
    for (count, id) in order.into_iter().enumerate() {
        let gate = gate_by_id[&id];
        let out_keys = keys[&gate.id];
        let table = match gate.kind {
            GateType::Not => {
                let a_keys = keys[&gate.inputs[0]];
                garble_not_gate(&a_keys, &out_keys, gate.id)
            }
            kind => {
                let a_keys = keys[&gate.inputs[0]];
                let b_keys = keys[&gate.inputs[1]];
                garble_two_input_gate(kind, &a_keys, &b_keys, &out_keys, gate.id)
            }
        };
        tables.insert(gate.id, table);
        if (count as u64).is_multiple_of(PROGRESS_UPDATE_INTERVAL) {
            pb.set_position(count as u64);
        }
    }
    pb.finish_with_message(format!("garbled {} gates", tables.len()));

    GarbledCircuit { keys, tables }
}

impl GarbledCircuit {
    /// The decoding map sent alongside the garbled tables: for each of
    /// `circuit`'s declared output wires, the signal bit of `label0`. The
    /// evaluator recovers the plaintext bit by XORing this against the
    /// signal bit it observes while evaluating (see [`crate::evaluator`]).
    pub fn pbits_out(&self, circuit: &Circuit) -> HashMap<WireId, bool> {
        circuit
            .out
            .iter()
            .map(|&wire| (wire, self.keys[&wire].pbit0))
            .collect()
    }
}

/// Derive the symmetric key a garbled-table cell is encrypted under, from
/// the input label and the gate id (domain separation between gates whose
/// labels happen to collide).
pub(crate) fn cell_key(label: &WireLabel, gate_id: WireId, slot: u8) -> Vec<u8> {
    let mut buf = Vec::with_capacity(LABEL_LEN + 5);
    buf.extend_from_slice(label.as_bytes());
    buf.extend_from_slice(&gate_id.to_le_bytes());
    buf.push(slot);
    buf
}

/// Pack `(output label, output signal bit)` as the plaintext payload of a
/// garbled-table cell.
pub(crate) fn pack_payload(label: &WireLabel, pbit: bool) -> Vec<u8> {
    let mut payload = label.as_bytes().to_vec();
    payload.push(pbit as u8);
    payload
}

/// Unpack a decrypted garbled-table cell back into `(output label, output
/// signal bit)`.
pub fn unpack_payload(bytes: &[u8]) -> (WireLabel, bool) {
    assert_eq!(bytes.len(), LABEL_LEN + 1);
    let mut label = [0u8; LABEL_LEN];
    label.copy_from_slice(&bytes[..LABEL_LEN]);
    (WireLabel(label), bytes[LABEL_LEN] != 0)
}

fn garble_two_input_gate(
    kind: GateType,
    a_keys: &WireKeyPair,
    b_keys: &WireKeyPair,
    out_keys: &WireKeyPair,
    gate_id: WireId,
) -> GarbledTable {
    let mut rows: [[Ciphertext; 2]; 2] = [
        [Ciphertext(Vec::new()), Ciphertext(Vec::new())],
        [Ciphertext(Vec::new()), Ciphertext(Vec::new())],
    ];
    for a_bit in [false, true] {
        for b_bit in [false, true] {
            let (a_label, a_pbit) = a_keys.label_for(a_bit);
            let (b_label, b_pbit) = b_keys.label_for(b_bit);
            let out_bit = kind.eval(a_bit, b_bit);
            let (out_label, out_pbit) = out_keys.label_for(out_bit);
            let k1 = cell_key(&a_label, gate_id, 0);
            let k2 = cell_key(&b_label, gate_id, 1);
            let ct = cipher::encrypt(&k1, &k2, &pack_payload(&out_label, out_pbit));
            rows[a_pbit as usize][b_pbit as usize] = ct;
        }
    }
    GarbledTable::TwoInput(rows)
}

fn garble_not_gate(a_keys: &WireKeyPair, out_keys: &WireKeyPair, gate_id: WireId) -> GarbledTable {
    let mut rows: [Ciphertext; 2] = [Ciphertext(Vec::new()), Ciphertext(Vec::new())];
    for a_bit in [false, true] {
        let (a_label, a_pbit) = a_keys.label_for(a_bit);
        let out_bit = !a_bit;
        let (out_label, out_pbit) = out_keys.label_for(out_bit);
        let k1 = cell_key(&a_label, gate_id, 0);
        let ct = cipher::encrypt(&k1, &NOT_GATE_AUX_KEY, &pack_payload(&out_label, out_pbit));
        rows[a_pbit as usize] = ct;
    }
    GarbledTable::OneInput(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Gate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn xor_circuit() -> Circuit {
        Circuit {
            id: "xor".to_string(),
            alice: vec![1],
            bob: vec![2],
            out: vec![3],
            gates: vec![Gate {
                id: 3,
                kind: GateType::Xor,
                inputs: vec![1, 2],
            }],
        }
    }

    #[test]
    fn label_pair_is_distinct() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let keys = WireKeyPair::random(&mut rng);
        assert_ne!(keys.label0.0, keys.label1.0);
        let (_, pbit0) = keys.label_for(false);
        let (_, pbit1) = keys.label_for(true);
        assert_ne!(pbit0, pbit1);
    }

    #[test]
    fn garbling_produces_one_table_per_gate() {
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let circuit = xor_circuit();
        let gc = garble_circuit(&circuit, &mut rng);
        assert_eq!(gc.tables.len(), 1);
        assert!(gc.keys.contains_key(&1));
        assert!(gc.keys.contains_key(&2));
        assert!(gc.keys.contains_key(&3));
    }

    #[test]
    fn not_gate_table_has_two_rows() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let circuit = Circuit {
            id: "not".to_string(),
            alice: vec![1],
            bob: vec![],
            out: vec![2],
            gates: vec![Gate {
                id: 2,
                kind: GateType::Not,
                inputs: vec![1],
            }],
        };
        let gc = garble_circuit(&circuit, &mut rng);
        match &gc.tables[&2] {
            GarbledTable::OneInput(_) => {}
            GarbledTable::TwoInput(_) => panic!("NOT gate should garble to a one-input table"),
        }
    }
}
