//! Wire message format exchanged between garbler and evaluator.
//!
//! `original_source/src/util.py` carries `Socket`/`EvaluatorSocket`/
//! `GarblerSocket` wrapping ZeroMQ REQ/REP sockets around pickled Python
//! dicts. This replaces the pickled payload with an explicit tagged enum,
//! serialized with `bincode` (spec.md §9's redesign flag).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::circuit::{Circuit, WireId};
use crate::garbler::{GarbledTable, WireLabel};
use crate::ot::{OtChoice, OtReply, OtSetup};

/// One message of the garbler/evaluator request-reply exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    /// Garbler -> Evaluator: opens a session.
    Hello,
    /// Either direction: generic acknowledgement.
    Ack,
    /// Garbler -> Evaluator: the garbled circuit and its output decoding map.
    Circuit {
        circuit: Circuit,
        tables: HashMap<WireId, GarbledTable>,
        pbits_out: HashMap<WireId, bool>,
    },
    /// Garbler -> Evaluator: Alice's own input labels, revealed directly
    /// since they encode only Alice's own data.
    GarblerInputs(HashMap<WireId, (WireLabel, bool)>),
    /// Garbler -> Evaluator: publishes the OT group and public key.
    OtSetup(OtSetup),
    /// Evaluator -> Garbler: one split per Bob input wire.
    OtChoice(HashMap<WireId, OtChoice>),
    /// Garbler -> Evaluator: one masked label pair per Bob input wire.
    OtReply(HashMap<WireId, OtReply>),
    /// Evaluator -> Garbler (OT-disabled mode only): Bob's input bits in
    /// the clear.
    BobInputsPlain(HashMap<WireId, bool>),
    /// Garbler -> Evaluator (OT-disabled mode only): the labels matching
    /// Bob's plaintext bits, sent without any cryptographic hiding.
    BobLabelsPlain(HashMap<WireId, (WireLabel, bool)>),
    /// Evaluator -> Garbler: the decoded output bits.
    EvalResult(HashMap<WireId, bool>),
}
