//! lrutool - command-line harness for lrukit caches

mod handler;
mod record;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use lrukit::{LruCache, ReadPolicy, TracingListener};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::handler::{Command, CommandHandler, Response};
use crate::record::parse_framed;

/// Script run by the `demo` subcommand
const DEMO_SCRIPT: &str = "\
set key1 999
set key2 888
set key3 777
set key4 666
set key5 555
set key6 444
print
del key2
set key5 1000
print
";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of entries)
    #[arg(short, long, default_value_t = 10, global = true)]
    capacity: usize,

    /// Reads do not promote entries
    #[arg(long, global = true)]
    no_promote: bool,

    /// Do not report lifecycle events at all
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Send lifecycle events to the log (RUST_LOG=debug) instead of stdout
    #[arg(long, global = true)]
    log_events: bool,

    #[command(subcommand)]
    mode: Mode,
}

/// Where cache lifecycle events go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventSink {
    None,
    Stdout,
    Tracing,
}

impl EventSink {
    fn from_flags(quiet: bool, log_events: bool) -> Self {
        if quiet {
            EventSink::None
        } else if log_events {
            EventSink::Tracing
        } else {
            EventSink::Stdout
        }
    }
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run the built-in demo scenario
    Demo,

    /// Execute a script of text commands ("-" reads stdin)
    Replay {
        /// Script path
        path: PathBuf,
    },

    /// Execute a file of length-prefixed binary records
    Bytes {
        /// Record file path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    info!("lrutool v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);

    let sink = EventSink::from_flags(args.quiet, args.log_events);
    let cache = build_cache(args.capacity, args.no_promote, sink)?;
    let mut handler = CommandHandler::new(cache);
    let mut out = io::stdout();

    match &args.mode {
        Mode::Demo => run_script(&mut handler, DEMO_SCRIPT.as_bytes(), &mut out)?,
        Mode::Replay { path } => {
            let input = open_script(path)?;
            run_script(&mut handler, input, &mut out)?;
        }
        Mode::Bytes { path } => run_records(&mut handler, path, &mut out)?,
    }

    let stats = handler.cache().stats();
    info!(
        hits = stats.hits(),
        misses = stats.misses(),
        evictions = stats.evictions(),
        "Done, {} entries resident",
        handler.cache().len()
    );
    Ok(())
}

fn build_cache(capacity: usize, no_promote: bool, sink: EventSink) -> Result<LruCache<String, i32>> {
    let policy = if no_promote {
        ReadPolicy::Peek
    } else {
        ReadPolicy::Promote
    };

    let builder = LruCache::<String, i32>::builder(capacity).read_policy(policy);
    let builder = match sink {
        EventSink::None => builder,
        EventSink::Stdout => builder.on_event(|event, len| println!("size:{} {}", len, event)),
        EventSink::Tracing => builder.listener(TracingListener),
    };

    builder.build().context("Invalid cache configuration")
}

fn open_script(path: &Path) -> Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn run_script<R: BufRead, W: Write>(
    handler: &mut CommandHandler,
    input: R,
    out: &mut W,
) -> Result<()> {
    for (idx, line) in input.lines().enumerate() {
        let line = line.context("Failed to read script")?;
        let lineno = idx + 1;

        let Some(cmd) = Command::parse(&line).map_err(|e| anyhow!("line {}: {}", lineno, e))?
        else {
            continue;
        };

        let response = handler.handle(cmd);
        if let Response::Error(e) = &response {
            warn!("line {}: {}", lineno, e);
        }
        writeln!(out, "{}", response)?;
    }
    Ok(())
}

fn run_records<W: Write>(handler: &mut CommandHandler, path: &Path, out: &mut W) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let records = parse_framed(&data).map_err(|e| anyhow!("{}: {}", path.display(), e))?;
    info!("Loaded {} records", records.len());

    for record in records {
        let response = handler.handle(Command::from(record));
        writeln!(out, "{}", response)?;
    }

    let snapshot = serde_json::to_string_pretty(&handler.snapshot())?;
    writeln!(out, "{}", snapshot)?;
    Ok(())
}
