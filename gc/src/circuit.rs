//! Circuit data model and the JSON wire format of §6.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::GcError;

/// A wire id, unique within one circuit.
pub type WireId = u32;

/// Gate operator. `Not` takes one input; all others take two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateType {
    And,
    Or,
    Xor,
    Xnor,
    Nand,
    Nor,
    Not,
}

impl GateType {
    /// Number of input wires this gate type expects.
    pub fn arity(self) -> usize {
        match self {
            GateType::Not => 1,
            _ => 2,
        }
    }

    /// Evaluate the gate in plaintext. `b` is ignored for `Not`.
    pub fn eval(self, a: bool, b: bool) -> bool {
        match self {
            GateType::And => a && b,
            GateType::Or => a || b,
            GateType::Xor => a ^ b,
            GateType::Xnor => !(a ^ b),
            GateType::Nand => !(a && b),
            GateType::Nor => !(a || b),
            GateType::Not => !a,
        }
    }
}

/// `(id, type, in[])`; the gate's output wire id equals the gate's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    pub id: WireId,
    #[serde(rename = "type")]
    pub kind: GateType,
    #[serde(rename = "in")]
    pub inputs: Vec<WireId>,
}

/// `(id, alice[], bob[], out[], gates[])`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circuit {
    pub id: String,
    pub alice: Vec<WireId>,
    pub bob: Vec<WireId>,
    pub out: Vec<WireId>,
    pub gates: Vec<Gate>,
}

/// Top-level JSON envelope: `{ "name": ..., "circuits": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitFile {
    pub name: String,
    pub circuits: Vec<Circuit>,
}

impl CircuitFile {
    /// Load and parse a circuit file from disk. Does not validate circuits;
    /// call [`Circuit::validate`] on each before use.
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Serialize and write a circuit file to disk.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> anyhow::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl Circuit {
    /// Validate the structural invariants of spec.md §3:
    ///
    /// - every wire referenced as a gate input is either a circuit input or
    ///   the output of some gate;
    /// - no wire id is the output of two gates;
    /// - `out ⊆ alice ∪ bob ∪ {gate.id}`;
    /// - `alice ∩ bob = ∅`;
    /// - gate inputs form a DAG.
    pub fn validate(&self) -> Result<(), GcError> {
        let alice: HashSet<_> = self.alice.iter().collect();
        let bob: HashSet<_> = self.bob.iter().collect();
        if let Some(&shared) = alice.intersection(&bob).next() {
            return Err(GcError::CircuitMalformed(format!(
                "wire {shared} is both an alice and a bob input"
            )));
        }

        let mut produced: HashMap<WireId, ()> = HashMap::new();
        for gate in &self.gates {
            if gate.inputs.len() != gate.kind.arity() {
                return Err(GcError::CircuitMalformed(format!(
                    "gate {} ({:?}) expects {} input(s), got {}",
                    gate.id,
                    gate.kind,
                    gate.kind.arity(),
                    gate.inputs.len()
                )));
            }
            if produced.insert(gate.id, ()).is_some() {
                return Err(GcError::CircuitMalformed(format!(
                    "wire {} is the output of more than one gate",
                    gate.id
                )));
            }
        }

        let circuit_inputs: HashSet<_> = alice.union(&bob).copied().collect();
        for gate in &self.gates {
            for &input in &gate.inputs {
                if !circuit_inputs.contains(&input) && !produced.contains_key(&input) {
                    return Err(GcError::CircuitMalformed(format!(
                        "gate {} references undefined wire {}",
                        gate.id, input
                    )));
                }
            }
        }

        for &w in &self.out {
            if !circuit_inputs.contains(&w) && !produced.contains_key(&w) {
                return Err(GcError::CircuitMalformed(format!(
                    "output wire {w} is not an input or a gate output"
                )));
            }
        }

        self.topological_gate_order()?;
        Ok(())
    }

    /// Every wire id that appears anywhere in the circuit: circuit inputs
    /// and gate outputs. Used to drive label/p-bit assignment (spec.md §4.4).
    pub fn all_wire_ids(&self) -> Vec<WireId> {
        let mut ids: Vec<WireId> = self
            .alice
            .iter()
            .chain(self.bob.iter())
            .copied()
            .chain(self.gates.iter().map(|g| g.id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Topologically sort gates by their wire dependencies (Kahn's
    /// algorithm), returning `GcError::CircuitMalformed` if the gate graph
    /// has a cycle. Ascending gate-id order is attempted first and accepted
    /// as-is when it already respects dependencies (the common case for
    /// circuits generated by [`crate::adder::build_adder_circuit`]), since
    /// spec.md §3 states "topological order is the ascending order of gate
    /// ids by default".
    pub fn topological_gate_order(&self) -> Result<Vec<WireId>, GcError> {
        let circuit_inputs: HashSet<WireId> =
            self.alice.iter().chain(self.bob.iter()).copied().collect();
        let gate_by_id: HashMap<WireId, &Gate> = self.gates.iter().map(|g| (g.id, g)).collect();

        let mut indegree: HashMap<WireId, usize> = HashMap::new();
        let mut dependents: HashMap<WireId, Vec<WireId>> = HashMap::new();
        for gate in &self.gates {
            let mut deps = 0usize;
            for &input in &gate.inputs {
                if gate_by_id.contains_key(&input) {
                    dependents.entry(input).or_default().push(gate.id);
                    deps += 1;
                } else if !circuit_inputs.contains(&input) {
                    return Err(GcError::CircuitMalformed(format!(
                        "gate {} references undefined wire {}",
                        gate.id, input
                    )));
                }
            }
            indegree.insert(gate.id, deps);
        }

        let mut ready: VecDeque<WireId> = self
            .gates
            .iter()
            .filter(|g| indegree[&g.id] == 0)
            .map(|g| g.id)
            .collect();
        // Ascending order gives a deterministic, spec-preferred tie-break.
        let mut ready_sorted: Vec<WireId> = ready.drain(..).collect();
        ready_sorted.sort_unstable();
        let mut ready: VecDeque<WireId> = ready_sorted.into();

        let mut order = Vec::with_capacity(self.gates.len());
        while let Some(id) = ready.pop_front() {
            order.push(id);
            if let Some(deps) = dependents.get(&id) {
                let mut newly_ready = Vec::new();
                for &dep in deps {
                    let entry = indegree.get_mut(&dep).unwrap();
                    *entry -= 1;
                    if *entry == 0 {
                        newly_ready.push(dep);
                    }
                }
                newly_ready.sort_unstable();
                for id in newly_ready {
                    ready.push_back(id);
                }
            }
        }

        if order.len() != self.gates.len() {
            return Err(GcError::CircuitMalformed(
                "gate dependency graph contains a cycle".to_string(),
            ));
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn valid_circuit_passes() {
        assert!(xor_circuit().validate().is_ok());
    }

    #[test]
    fn duplicate_gate_output_rejected() {
        let mut c = xor_circuit();
        c.gates.push(Gate {
            id: 3,
            kind: GateType::And,
            inputs: vec![1, 2],
        });
        assert!(c.validate().is_err());
    }

    #[test]
    fn dangling_reference_rejected() {
        let mut c = xor_circuit();
        c.gates[0].inputs = vec![1, 99];
        assert!(c.validate().is_err());
    }

    #[test]
    fn alice_bob_overlap_rejected() {
        let mut c = xor_circuit();
        c.bob.push(1);
        assert!(c.validate().is_err());
    }

    #[test]
    fn cycle_is_rejected() {
        let c = Circuit {
            id: "cycle".to_string(),
            alice: vec![1],
            bob: vec![2],
            out: vec![4],
            gates: vec![
                Gate {
                    id: 3,
                    kind: GateType::And,
                    inputs: vec![1, 4],
                },
                Gate {
                    id: 4,
                    kind: GateType::And,
                    inputs: vec![2, 3],
                },
            ],
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn json_round_trip_matches_schema() {
        let json = r#"{
            "name": "test",
            "circuits": [
                { "id": "xor", "alice": [1], "bob": [2], "out": [3],
                  "gates": [ { "id": 3, "type": "XOR", "in": [1, 2] } ] }
            ]
        }"#;
        let file: CircuitFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.circuits.len(), 1);
        assert_eq!(file.circuits[0].gates[0].kind, GateType::Xor);
    }
}
