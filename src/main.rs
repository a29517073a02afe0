//! Gatesim - Digital Logic Circuit Simulator
//!
//! Loads a circuit document, sets its input switches, runs the simulation
//! until it settles and prints the state of every output bulb.
//!
//! # Usage
//!
//! ```bash
//! gatesim adder.json --library ./library --set A=1 --set B=0 --toggle CIN
//! gatesim half_adder.json --export-chip HALF_ADDER
//! ```

use std::path::PathBuf;

use clap::Parser;
use gatesim_core::{
    components::Gate,
    document::{export_chip, load_circuit, read_document, DirectoryLibrary},
    error::{GatesimError, Result},
    Circuit, NodeId, SimulationEngine,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Digital logic circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the circuit document (.json)
    #[arg(value_name = "CIRCUIT_FILE")]
    circuit_file: PathBuf,

    /// Directory holding custom gate definitions
    #[arg(short, long, default_value = "library")]
    library: PathBuf,

    /// Set an input switch by name, e.g. `--set A=1`
    #[arg(long = "set", value_name = "NAME=0|1", value_parser = parse_assignment)]
    assignments: Vec<(String, bool)>,

    /// Toggle an input switch by name
    #[arg(long = "toggle", value_name = "NAME")]
    toggles: Vec<String>,

    /// Stop after this many events, even if the circuit has not settled
    #[arg(long, default_value_t = 100_000)]
    max_events: usize,

    /// Save the circuit as a chip with this name instead of simulating it
    #[arg(long, value_name = "NAME")]
    export_chip: Option<String>,
}

fn parse_assignment(arg: &str) -> std::result::Result<(String, bool), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=0|1, got '{arg}'"))?;
    let high = match value.trim() {
        "1" => true,
        "0" => false,
        other => return Err(format!("switch value must be 0 or 1, got '{other}'")),
    };
    Ok((name.trim().to_string(), high))
}

fn switch_named(circuit: &Circuit, name: &str) -> Result<NodeId> {
    circuit
        .nodes()
        .find(|n| n.name() == name && n.gate().is_switch())
        .map(|n| n.id())
        .ok_or_else(|| GatesimError::SwitchNotFound {
            name: name.to_string(),
        })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Load the circuit, resolving custom gates from the library
    let library = DirectoryLibrary::new(&args.library);
    let doc = read_document(&args.circuit_file)?;
    let (circuit, report) = load_circuit(&doc, &library);
    if !report.is_clean() {
        warn!(
            issues = report.issues.len(),
            "circuit loaded with skipped entries"
        );
    }

    if let Some(name) = &args.export_chip {
        let chip = export_chip(&circuit, name);
        let path = library.save_chip(name, &chip)?;
        println!("saved chip '{}' to {}", name, path.display());
        return Ok(());
    }

    // Resolve switch names before the engine takes the circuit
    let mut assignments = Vec::with_capacity(args.assignments.len());
    for (name, high) in &args.assignments {
        assignments.push((switch_named(&circuit, name)?, *high));
    }
    let mut toggles = Vec::with_capacity(args.toggles.len());
    for name in &args.toggles {
        toggles.push(switch_named(&circuit, name)?);
    }

    let mut engine = SimulationEngine::new(circuit);
    for (id, high) in assignments {
        engine.set_switch(id, high);
    }
    for id in toggles {
        engine.toggle(id);
    }
    engine.resync();

    let events = engine.run_until_idle(args.max_events)?;
    if engine.pending_events() > 0 {
        warn!(
            events,
            pending = engine.pending_events(),
            "event limit reached; circuit may be oscillating"
        );
    }
    info!(events, "simulation finished");

    let bulbs = engine.inspect(|c| {
        c.sorted_by_name(|n| n.gate().is_bulb())
            .into_iter()
            .filter_map(|id| c.node(id))
            .map(|n| match n.gate() {
                Gate::OutputBulb(bulb) => (n.name().to_string(), bulb.is_active()),
                _ => (n.name().to_string(), false),
            })
            .collect::<Vec<_>>()
    });
    for (name, active) in bulbs {
        println!("{}: {}", name, if active { "ON" } else { "OFF" });
    }
    println!("simulation time: {}", engine.simulation_time());

    Ok(())
}
