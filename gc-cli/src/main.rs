//! Command-line front end for the `gc` garbled-circuits protocol.
//!
//! Mirrors `original_source/src/main.py`'s argument surface: a party
//! (`alice`/`bob`), a shared circuit file, per-party private input files, an
//! output file, the adder's bit width, the OT-disabled test flag and a log
//! level.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use tracing::info;

use gc::adder::build_adder_circuit;
use gc::bits::{from_bits, to_bits};
use gc::circuit::{Circuit, CircuitFile, WireId};
use gc::constants::DEFAULT_GROUP_BITS;
use gc::protocol::{Evaluator, Garbler};
use gc::transport::{Listener, connect};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Party {
    Alice,
    Bob,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    fn as_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Error | LogLevel::Critical => tracing::Level::ERROR,
        }
    }
}

/// Run one side of a two-party Yao garbled-circuit evaluation.
#[derive(Parser, Debug)]
#[command(name = "gc-cli", version)]
struct Cli {
    /// Which party to run.
    party: Party,

    /// Path to the shared circuit description, JSON per gc::circuit.
    #[arg(long, default_value = "./circuit.json")]
    circuit: PathBuf,

    /// Alice's private input file (required for `alice`).
    #[arg(long)]
    alice: Option<PathBuf>,

    /// Bob's private input file (required for `bob`).
    #[arg(long)]
    bob: Option<PathBuf>,

    /// Where Alice writes the decoded result (defaults to stdout).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Bit width of each party's adder input.
    #[arg(long, default_value_t = 8)]
    bits: u32,

    /// Disable oblivious transfer: Bob's input bits are sent in the clear.
    /// Test-only; never secure against a curious evaluator.
    #[arg(long)]
    no_oblivious_transfer: bool,

    /// TCP port the evaluator binds and the garbler connects to.
    #[arg(long, default_value_t = gc::constants::DEFAULT_PORT)]
    port: u16,

    /// Host the garbler connects to (ignored by the evaluator, which binds
    /// all interfaces).
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value = "warning")]
    loglevel: LogLevel,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.loglevel.as_tracing_level())
        .init();

    let result = match cli.party {
        Party::Alice => run_alice(&cli),
        Party::Bob => run_bob(&cli),
    };

    if let Err(e) = &result {
        // `tracing` has no level below ERROR; a user who asked for
        // `--loglevel critical` gets the same ERROR record plus a marker
        // field distinguishing it from an ordinary logged error.
        if matches!(cli.loglevel, LogLevel::Critical) {
            tracing::error!(critical = true, error = %e, "fatal error");
        } else {
            tracing::error!(error = %e, "fatal error");
        }
        if let Some(gc_err) = e.chain().find_map(|cause| cause.downcast_ref::<gc::GcError>()) {
            std::process::exit(gc_err.exit_code());
        }
        std::process::exit(2);
    }
    result
}

fn run_alice(cli: &Cli) -> Result<()> {
    let alice_path = cli
        .alice
        .as_ref()
        .context("--alice is required when running as alice")?;

    validate_bit_width(cli.bits)?;
    let circuit = build_adder_circuit(cli.bits);
    circuit.validate().context("generated circuit is invalid")?;
    let file = CircuitFile {
        name: "adder".to_string(),
        circuits: vec![circuit.clone()],
    };
    file.save(&cli.circuit)
        .context("failed to write circuit file")?;

    let value = read_aggregated_input(alice_path)?;
    let alice_bits = to_bits(value, cli.bits)?;
    let alice_inputs = wire_bits(&circuit.alice, &alice_bits)?;

    info!(value, bits = cli.bits, "alice's private input");

    let mut rng = ChaCha12Rng::from_os_rng();
    let addr = format!("{}:{}", cli.host, cli.port);
    let mut conn = connect(&addr).context("failed to connect to evaluator")?;

    let garbler = Garbler::new(!cli.no_oblivious_transfer, DEFAULT_GROUP_BITS);
    let out_bits = garbler.run_circuit(&circuit, &alice_inputs, &mut conn, &mut rng)?;

    let decoded = decode_output(&circuit, &out_bits)?;
    write_output(cli.output.as_deref(), decoded)?;
    Ok(())
}

fn run_bob(cli: &Cli) -> Result<()> {
    let bob_path = cli
        .bob
        .as_ref()
        .context("--bob is required when running as bob")?;

    validate_bit_width(cli.bits)?;
    let file = CircuitFile::load(&cli.circuit).context("failed to read circuit file")?;
    let circuit = file
        .circuits
        .into_iter()
        .next()
        .context("circuit file contains no circuits")?;
    circuit.validate().context("circuit file is invalid")?;

    let value = read_aggregated_input(bob_path)?;
    let bob_bits = to_bits(value, cli.bits)?;
    let bob_inputs = wire_bits(&circuit.bob, &bob_bits)?;

    info!(value, bits = cli.bits, "bob's private input");

    let mut rng = ChaCha12Rng::from_os_rng();
    let listener = Listener::bind(("0.0.0.0", cli.port)).context("failed to bind listener")?;

    let evaluator = Evaluator::new(!cli.no_oblivious_transfer);
    info!(port = cli.port, "waiting for garbler");
    evaluator.serve_one(&listener, &bob_inputs, &mut rng)?;
    Ok(())
}

/// Reject `--bits` values that would otherwise reach
/// [`build_adder_circuit`]'s or [`to_bits`]'s internal `assert!`s: the
/// reference adder needs at least 2 input bits per party, and two's
/// complement encoding needs a width of at most 64. A bad `--bits` is a
/// clean input error (spec.md §7, exit code 2), not a process abort.
fn validate_bit_width(bits: u32) -> Result<()> {
    if !(2..=64).contains(&bits) {
        return Err(gc::GcError::CircuitMalformed(format!(
            "--bits {bits} is out of range: must be between 2 and 64"
        ))
        .into());
    }
    Ok(())
}

/// Zip a party's wire-id list (MSB first, per `gc::adder`) against an
/// MSB-first bit vector.
fn wire_bits(wires: &[WireId], bits: &[bool]) -> Result<HashMap<WireId, bool>> {
    if wires.len() != bits.len() {
        bail!(
            "circuit declares {} input wires but {} bits were supplied",
            wires.len(),
            bits.len()
        );
    }
    Ok(wires.iter().copied().zip(bits.iter().copied()).collect())
}

/// Decode the circuit's declared output wires (MSB first) back into an
/// integer.
fn decode_output(circuit: &Circuit, bits: &HashMap<WireId, bool>) -> Result<i64> {
    let ordered: Result<Vec<bool>> = circuit
        .out
        .iter()
        .map(|wire| {
            bits.get(wire)
                .copied()
                .with_context(|| format!("missing output bit for wire {wire}"))
        })
        .collect();
    Ok(from_bits(&ordered?))
}

/// Read whitespace-separated integers from `path` and sum them, mirroring
/// `original_source/src/util.py::read_input_data`'s default aggregator.
fn read_aggregated_input(path: &std::path::Path) -> Result<i64> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    data.split_whitespace()
        .map(|tok| {
            tok.parse::<i64>()
                .with_context(|| format!("invalid integer {tok:?} in {}", path.display()))
        })
        .try_fold(0i64, |acc, n| Ok(acc + n?))
}

fn write_output(path: Option<&std::path::Path>, value: i64) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, format!("{value}\n"))
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            println!("{value}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_sums_whitespace_separated_integers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "5 7\n-2\n").unwrap();
        assert_eq!(read_aggregated_input(&path).unwrap(), 10);
    }

    #[test]
    fn rejects_non_integer_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "5 seven\n").unwrap();
        assert!(read_aggregated_input(&path).is_err());
    }

    #[test]
    fn wire_bits_rejects_length_mismatch() {
        assert!(wire_bits(&[1, 2], &[true]).is_err());
        assert!(wire_bits(&[1, 2], &[true, false]).is_ok());
    }

    #[test]
    fn validate_bit_width_rejects_too_small_and_too_large() {
        assert!(validate_bit_width(0).is_err());
        assert!(validate_bit_width(1).is_err());
        assert!(validate_bit_width(65).is_err());
        assert!(validate_bit_width(2).is_ok());
        assert!(validate_bit_width(8).is_ok());
        assert!(validate_bit_width(64).is_ok());
    }

    #[test]
    fn decode_output_round_trips_with_to_bits() {
        let circuit = build_adder_circuit(4);
        let alice_bits = to_bits(3, 4).unwrap();
        let bob_bits = to_bits(2, 4).unwrap();
        let mut bits = wire_bits(&circuit.alice, &alice_bits).unwrap();
        bits.extend(wire_bits(&circuit.bob, &bob_bits).unwrap());
        for gate in &circuit.gates {
            let a = bits[&gate.inputs[0]];
            let b = if gate.inputs.len() > 1 {
                bits[&gate.inputs[1]]
            } else {
                a
            };
            bits.insert(gate.id, gate.kind.eval(a, b));
        }
        assert_eq!(decode_output(&circuit, &bits).unwrap(), 5);
    }
}
