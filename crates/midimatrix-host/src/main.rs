//! midimatrix: run the modulation matrix and chord strummer between MIDI ports

mod config;
mod midi_io;
mod processor;
mod scheduler;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::ParamOverride;
use processor::Processor;
use scheduler::OutputScheduler;

#[derive(Debug, Parser)]
#[command(name = "midimatrix", version, about = "MIDI modulation matrix and chord strummer")]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input port name substring; overrides the config file
    #[arg(short, long)]
    input: Option<String>,

    /// Output port name substring; overrides the config file
    #[arg(short, long)]
    output: Option<String>,

    /// Set an engine parameter, e.g. `strum.steps=2`
    #[arg(long = "set", value_name = "ENGINE.PARAM=VALUE")]
    set: Vec<ParamOverride>,

    /// Print available MIDI ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Print engine parameters and exit
    #[arg(long)]
    list_params: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "midimatrix=debug,midimatrix_core=debug"
    } else {
        "midimatrix=info,midimatrix_core=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_ports {
        let (inputs, outputs) = midi_io::list_ports()?;
        println!("Inputs:");
        for name in inputs {
            println!("  {name}");
        }
        println!("Outputs:");
        for name in outputs {
            println!("  {name}");
        }
        return Ok(());
    }

    let mut config = config::load_config(args.config.as_deref())?;
    if args.input.is_some() {
        config.ports.input = args.input;
    }
    if args.output.is_some() {
        config.ports.output = args.output;
    }

    let mut chain = config.build_chain()?;
    for o in &args.set {
        chain.set_param(o.engine.effect_name(), &o.param, o.value);
    }

    if args.list_params {
        for effect in &chain.effects {
            println!("{}:", effect.name());
            for p in effect.get_params() {
                println!("  {} = {} ({}..={})", p.name, p.value, p.min, p.max);
            }
        }
        return Ok(());
    }

    tracing::info!(engines = ?config.engines, "starting midimatrix");

    let output = midi_io::open_output(&config.ports)?;
    let (scheduler, handle) = OutputScheduler::start(output).context("failed to start output thread")?;
    let mut processor = Processor::new(chain, config.targets.clone(), handle);
    let input = midi_io::open_input(&config.ports, move |message| processor.handle_message(message))?;

    println!("Running. Press Enter to quit.");
    std::io::stdin().read_line(&mut String::new())?;

    // Dropping the input callback releases the last scheduler handle
    drop(input.close());
    scheduler.join();
    tracing::info!("stopped");
    Ok(())
}
