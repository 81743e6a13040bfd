//! agecache-sim - replay access traces against an LFUDA cache

mod replay;
mod trace;

use std::io::{self, BufReader};
use std::path::PathBuf;

use agecache::{Config, DEFAULT_MAX_HITS};
use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::replay::{Replayer, Report};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of items)
    #[arg(short, long, default_value_t = 1000)]
    capacity: usize,

    /// Hit count that triggers a drift of every counter
    #[arg(long, default_value_t = DEFAULT_MAX_HITS)]
    max_hits: i64,

    /// Trace file (reads stdin when omitted)
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Print cached entries, most used first
    #[arg(long)]
    dump: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config::new(self.capacity).with_max_hits(self.max_hits)
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting agecache-sim v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);

    let mut replayer = Replayer::new(args.config())?;
    match &args.trace {
        Some(path) => {
            info!("Trace file: {}", path.display());
            replayer.replay_file(path)?;
        }
        None => replayer.replay(BufReader::new(io::stdin().lock()))?,
    }

    let report = replayer.report();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if args.dump {
        for (key, value) in replayer.cache() {
            let hits = replayer.cache().hits(key).unwrap_or_default();
            println!("{}\t{}\t{}", hits, key, value);
        }
    }

    Ok(())
}

fn print_report(report: &Report) {
    println!("operations:  {}", report.operations);
    println!("entries:     {}/{}", report.len, report.capacity);
    println!("threshold:   {}", report.threshold);
    println!("hits:        {}", report.hits);
    println!("misses:      {}", report.misses);
    println!("hit ratio:   {:.4}", report.hit_ratio);
    println!("inserts:     {}", report.inserts);
    println!("updates:     {}", report.updates);
    println!("evictions:   {}", report.evictions);
    println!("rejections:  {}", report.rejections);
    println!("drifts:      {}", report.drifts);
}
