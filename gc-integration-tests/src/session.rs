//! Drives a [`gc::protocol::Garbler`] against a [`gc::protocol::Evaluator`]
//! over a loopback TCP connection, for end-to-end integration tests.

use std::collections::HashMap;
use std::thread;

use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

use gc::circuit::{Circuit, WireId};
use gc::protocol::{Evaluator, Garbler};
use gc::transport::{Listener, connect};

/// Both parties' decoded results, returned separately so a test can assert
/// they agree (a protocol bug could make them diverge without either side
/// erroring).
pub struct SessionOutcome {
    pub garbler_result: HashMap<WireId, bool>,
    pub evaluator_result: HashMap<WireId, bool>,
}

/// Run one garbler/evaluator session for `circuit` and return both parties'
/// decoded output bits.
pub fn run_session(
    circuit: &Circuit,
    alice_inputs: &HashMap<WireId, bool>,
    bob_inputs: &HashMap<WireId, bool>,
    ot_enabled: bool,
    group_bits: u32,
) -> Result<SessionOutcome> {
    let listener = Listener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let bob_inputs = bob_inputs.clone();

    let evaluator_thread = thread::spawn(move || -> Result<HashMap<WireId, bool>> {
        let mut rng = ChaCha12Rng::seed_from_u64(0xB0B);
        let evaluator = Evaluator::new(ot_enabled);
        Ok(evaluator.serve_one(&listener, &bob_inputs, &mut rng)?)
    });

    let mut rng = ChaCha12Rng::seed_from_u64(0xA11CE);
    let mut conn = connect(addr)?;
    let garbler = Garbler::new(ot_enabled, group_bits);
    let garbler_result = garbler.run_circuit(circuit, alice_inputs, &mut conn, &mut rng)?;

    let evaluator_result = evaluator_thread
        .join()
        .expect("evaluator thread panicked")?;

    Ok(SessionOutcome {
        garbler_result,
        evaluator_result,
    })
}
