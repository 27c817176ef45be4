use clap::Parser as ClapParser;
use jitsched::{
    AtomMachineModel, InstRecord, LatencyReason, RecordingEncoder, Scheduler, SlotId,
    edit_distance, load_block,
};
use miette::{IntoDiagnostic, Result, bail};
use std::fs;
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "jitsched", about = "Schedule a native block against the Atom pipeline model")]
struct Cli {
    /// JSON array of instructions in program order
    input: PathBuf,

    /// Keep program order and only validate against the machine model
    #[arg(long)]
    no_schedule: bool,

    /// Write one Graphviz file per block into this directory
    #[arg(long)]
    dot_dir: Option<PathBuf>,

    /// Cycles added to edges into an address computation
    #[arg(long)]
    agen_stall: Option<u32>,

    /// Cycles added when a load waits on an earlier store
    #[arg(long)]
    load_blocked_by_store: Option<u32>,

    /// Minimum cycles between a memory load and its consumers
    #[arg(long)]
    memory_load: Option<u32>,

    /// Print per-block size, cycle count and reordering
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let text = fs::read_to_string(&cli.input).into_diagnostic()?;
    let instructions = load_block(&text).into_diagnostic()?;
    if instructions.is_empty() {
        bail!("{} contains no instructions", cli.input.display());
    }

    let mut builder = Scheduler::builder(AtomMachineModel, RecordingEncoder::new())
        .enabled(!cli.no_schedule)
        .statistics(cli.stats);
    let overrides = [
        (LatencyReason::AgenStall, cli.agen_stall),
        (LatencyReason::LoadBlockedByStore, cli.load_blocked_by_store),
        (LatencyReason::MemoryLoad, cli.memory_load),
    ];
    for (reason, cycles) in overrides {
        if let Some(cycles) = cycles {
            builder = builder.latency(reason, cycles);
        }
    }
    if let Some(dir) = &cli.dot_dir {
        fs::create_dir_all(dir).into_diagnostic()?;
        builder = builder.dump_dot(dir);
    }

    let mut scheduler = builder.build();
    log::info!("scheduling {} instructions", instructions.len());
    for inst in instructions {
        scheduler.append(inst).into_diagnostic()?;
    }
    scheduler.flush().into_diagnostic()?;
    let records = scheduler.into_encoder().take();

    let blocks = split_blocks(&records);
    print_table(&blocks);
    if cli.stats {
        for (index, block) in blocks.iter().enumerate() {
            let order: Vec<SlotId> = block.iter().map(|r| r.slot).collect();
            let cycles = block
                .iter()
                .filter_map(|r| r.scheduled_time)
                .max()
                .map_or_else(|| "-".to_string(), |last| (last + 1).to_string());
            println!(
                "block {}: {} instructions, {} cycles, edit distance {:.1}%",
                index,
                block.len(),
                cycles,
                edit_distance(&order)
            );
        }
    }
    Ok(())
}

/// Emitted records grouped per block; every delimiter closes one.
fn split_blocks(records: &[InstRecord]) -> Vec<&[InstRecord]> {
    records
        .split_inclusive(|r| r.inst.is_delimiter())
        .collect()
}

fn print_table(blocks: &[&[InstRecord]]) {
    println!(
        "{:>5}  {:>4}  {:>6}  {:>3}  {:>4}  instruction",
        "cycle", "slot", "port", "lat", "path"
    );
    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            println!();
        }
        for record in block.iter() {
            let cycle = record
                .scheduled_time
                .map_or_else(|| "-".to_string(), |t| t.to_string());
            let path = record
                .longest_path
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            println!(
                "{:>5}  {:>4}  {:>6}  {:>3}  {:>4}  {}",
                cycle,
                record.slot,
                record.port,
                record.latency,
                path,
                record.inst
            );
        }
    }
}
