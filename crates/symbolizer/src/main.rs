use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use symbolizer_core::diagnostics::TracingSink;
use symbolizer_core::engine::create_engine;
use symbolizer_core::staging::{DEFAULT_INSTALL_DIR, SUPPORT_LIBRARIES};
use symbolizer_core::types::{Architecture, TraceStyle, SYSTEM, VERSION};
use symbolizer_core::{Session, SessionOptions};
use symbolizer_utils::{info, init_logging, init_logging_to_file, init_logging_with_level, warn, LogFormat, LogGuard, LogLevel};

mod trace;

use trace::{Radix, ReplayStats, TraceEntry};

/// Symbolize execution traces against a crash dump.
#[derive(Parser, Debug)]
#[command(name = "symbolizer")]
#[command(version)]
#[command(about = "Symbolize execution traces against a crash dump", long_about = None)]
struct Cli
{
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    /// Write logs to ~/.symbolizer instead of stderr
    #[arg(long, global = true, default_value_t = false)]
    log_to_file: bool,
    #[command(subcommand)]
    command: Commands,
}

/// Where the snapshot and its symbols come from.
#[derive(Args, Debug)]
struct DumpArgs
{
    /// Crash dump to load
    #[arg(short, long)]
    dump: PathBuf,
    /// Symbol search path handed to the engine
    #[arg(short, long)]
    symbol_path: Option<PathBuf>,
    /// Forward the engine's own symbol-loading output to the log (debug level)
    #[arg(long, default_value_t = false)]
    engine_output: bool,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Symbolize addresses (one per line) into module+offset or symbol+displacement
    Symbolize
    {
        #[command(flatten)]
        source: DumpArgs,
        /// Output style: modoff or fullsymbol
        #[arg(long, default_value_t = TraceStyle::FullSymbol)]
        style: TraceStyle,
        /// Trace file to read addresses from (stdin when neither this nor ADDRESSES is given)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// File to write symbolized lines to (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Addresses are decimal instead of hexadecimal
        #[arg(long, default_value_t = false)]
        decimal: bool,
        /// Addresses to symbolize (hex with or without 0x, WinDbg ` separators allowed)
        addresses: Vec<String>,
    },
    /// Resolve module!symbol names to addresses
    Resolve
    {
        #[command(flatten)]
        source: DumpArgs,
        /// Names to resolve, e.g. ntdll!NtClose
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Show version and build target information
    Info,
}

fn main()
{
    let cli = Cli::parse();

    let _guard = match start_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn start_logging(cli: &Cli) -> Result<LogGuard, Box<dyn std::error::Error>>
{
    if cli.log_to_file {
        let (path, guard) = init_logging_to_file(cli.log_level)?;
        eprintln!("Logging to {}", path.display());
        return Ok(guard);
    }

    let guard = match cli.log_level {
        Some(level) => init_logging_with_level(level, LogFormat::from_env()?)?,
        None => init_logging()?,
    };
    Ok(guard)
}

fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    match cli.command {
        Commands::Symbolize {
            source,
            style,
            input,
            output,
            decimal,
            addresses,
        } => {
            let radix = if decimal { Radix::Decimal } else { Radix::Hex };
            symbolize(&source, style, radix, input, output, &addresses)
        }
        Commands::Resolve { source, names } => resolve(&source, &names),
        Commands::Info => {
            print_info();
            Ok(())
        }
    }
}

fn open_session(dump: &DumpArgs, style: TraceStyle) -> Result<Session, Box<dyn std::error::Error>>
{
    let mut options = SessionOptions::default().with_default_style(style);
    if dump.engine_output {
        options = options.with_diagnostics(Arc::new(TracingSink));
    }

    let session = Session::open(create_engine()?, &dump.dump, dump.symbol_path.as_deref(), options)?;
    info!("Loaded {}", dump.dump.display());
    Ok(session)
}

fn symbolize(
    dump: &DumpArgs,
    style: TraceStyle,
    radix: Radix,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    addresses: &[String],
) -> Result<(), Box<dyn std::error::Error>>
{
    // Open the trace first so a bad input path fails before the dump loads
    let trace: Option<Box<dyn BufRead>> = match &input {
        Some(path) => Some(Box::new(BufReader::new(File::open(path)?))),
        None if addresses.is_empty() => Some(Box::new(io::stdin().lock())),
        None => None,
    };

    let positional = addresses
        .iter()
        .enumerate()
        .filter_map(|(index, text)| trace::parse_line(index + 1, text, radix))
        .map(Ok::<TraceEntry, io::Error>);
    let entries = positional.chain(trace.into_iter().flat_map(|reader| trace::read_entries(reader, radix)));

    let mut session = open_session(dump, style)?;

    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut stats = ReplayStats::default();
    for entry in entries {
        match entry? {
            TraceEntry::Address(address) => {
                let line = session.symbolize(address, style).map(str::to_string);
                stats.record(address, line.is_ok());
                match line {
                    Ok(line) => writeln!(out, "{line}")?,
                    Err(e) => {
                        warn!("Failed to symbolize {}: {}", address, e);
                        writeln!(out, "{address}")?;
                    }
                }
            }
            TraceEntry::Invalid { line, text } => {
                warn!("Skipping line {}: '{}' is not an address", line, text);
                stats.invalid += 1;
            }
        }
    }
    out.flush()?;

    stats.cache_hits = session.cache_stats().hits;
    eprintln!("{stats}");
    session.close();
    Ok(())
}

fn resolve(dump: &DumpArgs, names: &[String]) -> Result<(), Box<dyn std::error::Error>>
{
    let session = open_session(dump, TraceStyle::default())?;

    let mut failed = 0;
    for name in names {
        match session.resolve(name) {
            Ok(address) => println!("{name} = {address}"),
            Err(e) => {
                eprintln!("{name}: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} names could not be resolved", names.len()).into());
    }
    Ok(())
}

fn print_info()
{
    println!("symbolizer {VERSION}");
    println!("System: {SYSTEM}");
    println!("Architecture: {}", Architecture::current());
    match create_engine() {
        Ok(engine) => println!("Engine: {}", engine.name()),
        Err(e) => println!("Engine: unavailable ({e})"),
    }
    println!("Support libraries: {}", SUPPORT_LIBRARIES.join(", "));
    println!("Debugger install directory: {}", DEFAULT_INSTALL_DIR.display());
}
