use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use aplreg_core::catalog::{define, glossary, Catalog};
use aplreg_core::codec::{parse_encoding, resolve};
use aplreg_core::dump::{compare, DumpEngine, Snapshot};
use aplreg_core::error::{RegisterError, Result as RegisterResult};
use aplreg_core::parser::parse_value;
use aplreg_core::reader::{LldbReader, LldbTarget, RegisterReader, ReplayReader};
use aplreg_core::report::{self, OutputFormat};
use aplreg_core::research::{infer_fields, probe, sample, BehaviorSummary, EncodingRange};
use aplreg_core::types::{Category, Encoding, RegisterDefinition};
use aplreg_utils::{debug, info, init_logging_with_level, LogFormat, LogLevel};
use clap::{Args, Parser, Subcommand};

/// Read, decode, dump and compare Apple Silicon system registers.
#[derive(Parser, Debug)]
#[command(name = "aplreg")]
#[command(version)]
#[command(
    about = "Read, decode, dump and compare Apple Silicon system registers",
    long_about = None
)]
struct Cli
{
    #[command(flatten)]
    source: Source,

    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format written to stderr
    #[arg(long, global = true, env = "APLREG_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Where register values come from
#[derive(Args, Debug)]
struct Source
{
    /// Read from a running process through lldb
    #[arg(long, global = true, env = "APLREG_PID", conflicts_with_all = ["core", "replay"])]
    pid: Option<u32>,

    /// Read from a core file through lldb
    #[arg(long, global = true, env = "APLREG_CORE", conflicts_with = "replay")]
    core: Option<PathBuf>,

    /// Serve values from a saved snapshot instead of a live target
    #[arg(long, global = true, env = "APLREG_REPLAY")]
    replay: Option<PathBuf>,

    /// lldb executable
    #[arg(long, global = true, env = "APLREG_LLDB", default_value = "lldb")]
    lldb: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Read one register and print its decoded fields
    Read
    {
        /// Register name or encoding (s3_0_c15_c0_0 or sys_reg(3, 0, 15, 0, 0))
        register: String,
    },
    /// Decode a value without reading anything
    Decode
    {
        /// Register name or encoding
        register: String,
        /// Raw value (0x-prefixed hex or decimal)
        #[arg(value_parser = parse_raw_value)]
        value: u64,
    },
    /// Read every catalogued register (or one category) into a snapshot
    Dump
    {
        #[arg(short, long)]
        category: Option<Category>,
        /// Write the snapshot to this file
        #[arg(short, long)]
        save: Option<PathBuf>,
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
        /// Snapshot label
        #[arg(short, long, default_value = "snapshot")]
        label: String,
    },
    /// List catalogued registers
    List
    {
        #[arg(short, long)]
        category: Option<Category>,
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
    /// Show a register's field layout without reading it
    Describe
    {
        /// Register name or encoding
        register: String,
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
    /// Search register names, descriptions and field labels
    Search
    {
        /// Text to look for (case-insensitive)
        query: String,
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
    /// Expand abbreviations used in register names
    Glossary
    {
        /// Term to look up; lists every term when omitted
        term: Option<String>,
    },
    /// Compare two saved snapshots
    Compare
    {
        /// Earlier snapshot
        a: PathBuf,
        /// Later snapshot
        b: PathBuf,
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
    /// Read encodings the catalog does not know
    Probe
    {
        /// op0 value or LO-HI range
        #[arg(long, value_parser = parse_component_range, default_value = "3")]
        op0: RangeInclusive<u8>,
        #[arg(long, value_parser = parse_component_range, default_value = "0-7")]
        op1: RangeInclusive<u8>,
        #[arg(long, value_parser = parse_component_range, default_value = "15")]
        crn: RangeInclusive<u8>,
        #[arg(long, value_parser = parse_component_range, default_value = "0-15")]
        crm: RangeInclusive<u8>,
        #[arg(long, value_parser = parse_component_range, default_value = "0-7")]
        op2: RangeInclusive<u8>,
    },
    /// Read one register repeatedly and summarise how it behaves
    Sample
    {
        /// Register name or encoding
        register: String,
        #[arg(short = 'n', long, default_value_t = 100)]
        iterations: usize,
        /// Pause between reads in milliseconds
        #[arg(short, long, default_value_t = 10)]
        interval_ms: u64,
    },
}

/// A register the command should act on
enum Target<'c>
{
    Known(&'c RegisterDefinition),
    /// A valid encoding the catalog does not know
    Raw(Encoding),
}

impl Target<'_>
{
    fn encoding(&self) -> Encoding
    {
        match self {
            Target::Known(def) => def.encoding,
            Target::Raw(encoding) => *encoding,
        }
    }

    fn name(&self) -> String
    {
        match self {
            Target::Known(def) => def.name.clone(),
            Target::Raw(encoding) => encoding.to_string(),
        }
    }
}

fn main()
{
    let cli = Cli::parse();

    let _logging = match init_logging_with_level(cli.log_level, cli.log_format) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(cli: Cli) -> RegisterResult<()>
{
    let catalog = Catalog::apple_silicon()?;
    debug!(registers = catalog.len(), "Catalog loaded");

    match cli.command {
        Commands::Read { register } => {
            let target = resolve_target(&catalog, &register)?;
            let mut reader = open_reader(&cli.source)?;
            match target {
                Target::Known(_) => {
                    let mut engine = DumpEngine::new(&catalog, reader.as_mut());
                    let read = engine.read_one(&register)?;
                    let value = read.reading.value().unwrap_or_default();
                    print!("{}", report::register_text(read.definition, value, &read.fields));
                }
                Target::Raw(encoding) => {
                    let value = reader.read_register(encoding)?;
                    println!("{encoding} = {value:#018x}");
                    println!("  (not in the catalog; no field layout)");
                }
            }
            Ok(())
        }
        Commands::Decode { register, value } => {
            let definition = resolve(&catalog, &register)?;
            let fields = parse_value(definition, value)?;
            print!("{}", report::register_text(definition, value, &fields));
            Ok(())
        }
        Commands::Dump {
            category,
            save,
            format,
            label,
        } => {
            let mut reader = open_reader(&cli.source)?;
            let mut engine = DumpEngine::new(&catalog, reader.as_mut());
            let report = engine.dump(&label, category);

            if let Some(path) = &save {
                engine.persist(&report, path)?;
                eprintln!("Saved {} registers to {}", report.snapshot.len(), path.display());
            }
            print!("{}", engine.display(&report, format)?);
            if format == OutputFormat::Json {
                println!();
            }
            Ok(())
        }
        Commands::List { category, format } => {
            match format {
                OutputFormat::Text => print!("{}", report::catalog_text(&catalog, category)),
                OutputFormat::Json => println!("{}", report::catalog_json(&catalog, category)?),
            }
            Ok(())
        }
        Commands::Describe { register, format } => {
            let definition = resolve(&catalog, &register)?;
            match format {
                OutputFormat::Text => print!("{}", report::describe_text(definition)),
                OutputFormat::Json => println!("{}", report::describe_json(definition)?),
            }
            Ok(())
        }
        Commands::Search { query, format } => {
            let hits = catalog.search(&query);
            debug!(query = %query, hits = hits.len(), "Catalog searched");
            match format {
                OutputFormat::Text => print!("{}", report::search_text(&query, &hits)),
                OutputFormat::Json => println!("{}", report::search_json(&hits)?),
            }
            Ok(())
        }
        Commands::Glossary { term } => {
            match term {
                Some(term) => {
                    let meaning = define(&term)
                        .ok_or_else(|| RegisterError::InvalidArgument(format!("no glossary entry for {term}")))?;
                    println!("{}: {meaning}", term.trim().to_ascii_uppercase());
                }
                None => print!("{}", report::glossary_text(glossary())),
            }
            Ok(())
        }
        Commands::Compare { a, b, format } => {
            let first = Snapshot::load(&a)?;
            let second = Snapshot::load(&b)?;
            let diff = compare(&catalog, &first, &second)?;
            match format {
                OutputFormat::Text => print!("{}", report::diff_text(first.label(), second.label(), &diff)),
                OutputFormat::Json => println!("{}", report::diff_json(&diff)?),
            }
            Ok(())
        }
        Commands::Probe { op0, op1, crn, crm, op2 } => {
            let range = EncodingRange::new(op0, op1, crn, crm, op2)?;
            info!(range = %range, encodings = range.len(), "Probing");
            let mut reader = open_reader(&cli.source)?;
            let report = probe(&catalog, reader.as_mut(), &range);
            print!("{}", report::probe_text(&report));
            Ok(())
        }
        Commands::Sample {
            register,
            iterations,
            interval_ms,
        } => {
            let target = resolve_target(&catalog, &register)?;
            let mut reader = open_reader(&cli.source)?;
            let name = target.name();
            let readings = sample(
                reader.as_mut(),
                target.encoding(),
                &name,
                iterations,
                Duration::from_millis(interval_ms),
            )?;

            let summary = BehaviorSummary::from_readings(&readings);
            let inference = infer_fields(&readings).ok();
            print!("{}", report::behavior_text(&name, &summary, inference.as_ref()));
            Ok(())
        }
    }
}

/// Resolve a name or encoding, accepting valid encodings the catalog lacks
fn resolve_target<'c>(catalog: &'c Catalog, text: &str) -> RegisterResult<Target<'c>>
{
    match resolve(catalog, text) {
        Ok(definition) => Ok(Target::Known(definition)),
        Err(RegisterError::UnresolvedRegister(name)) => match parse_encoding(text) {
            Ok(encoding) => Ok(Target::Raw(encoding)),
            Err(_) => Err(RegisterError::UnresolvedRegister(name)),
        },
        Err(e) => Err(e),
    }
}

/// Build the reader selected by the global options
fn open_reader(source: &Source) -> RegisterResult<Box<dyn RegisterReader>>
{
    if let Some(path) = &source.replay {
        let reader = ReplayReader::load(path)?;
        info!(label = reader.label(), path = %path.display(), "Replaying snapshot");
        return Ok(Box::new(reader));
    }

    let target = match (source.pid, &source.core) {
        (Some(pid), _) => LldbTarget::Pid(pid),
        (None, Some(core)) => LldbTarget::Core(core.clone()),
        (None, None) => {
            return Err(RegisterError::InvalidArgument(String::from(
                "no register source: pass --pid, --core or --replay",
            )));
        }
    };

    info!(target = ?target, lldb = %source.lldb.display(), "Reading through lldb");
    Ok(Box::new(LldbReader::new(target).with_program(&source.lldb)))
}

/// `N` or `LO-HI`
fn parse_component_range(text: &str) -> Result<RangeInclusive<u8>, String>
{
    let number = |s: &str| {
        s.trim()
            .parse::<u8>()
            .map_err(|_| format!("'{s}' is not a component value"))
    };

    let range = match text.split_once('-') {
        Some((low, high)) => number(low)?..=number(high)?,
        None => {
            let value = number(text)?;
            value..=value
        }
    };

    if range.start() > range.end() {
        return Err(format!("range {text} is empty"));
    }
    Ok(range)
}

/// `0x`-prefixed hex or decimal
fn parse_raw_value(text: &str) -> Result<u64, String>
{
    let text = text.trim().replace('_', "");
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed.map_err(|e| format!("'{text}' is not a 64-bit value: {e}"))
}
