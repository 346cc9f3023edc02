//! Command-line interface for fieldmap

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use fieldmap::config::{EditorConfig, OrderPreference};
#[cfg(feature = "cli")]
use fieldmap::json_diff::{self, ExclusionList};
#[cfg(feature = "cli")]
use fieldmap::model::{MappedTable, MappingEntry};
#[cfg(feature = "cli")]
use fieldmap::session::MappingSession;
#[cfg(feature = "cli")]
use fieldmap::fix_fields;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "fieldmap")]
#[command(author, version, about = "Field-mapping XML inspection and export tool", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the entries of a mapping file
    Inspect {
        /// Path to the mapping XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output entries as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Re-export a mapping file, optionally deleting entries
    Save {
        /// Path to the mapping XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Editor configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Sort fields alphabetically
        #[arg(short, long)]
        alphabetical: bool,

        /// Delete the entry with this field name (repeatable)
        #[arg(short, long, value_name = "NAME")]
        delete: Vec<String>,
    },

    /// Look up FIX field names by tag number
    Tag {
        /// Tag numbers
        #[arg(value_name = "TAG", required = true)]
        tags: Vec<String>,
    },

    /// Compare two JSON documents
    #[command(name = "diff-json")]
    DiffJson {
        /// Left document
        #[arg(value_name = "LEFT")]
        left: PathBuf,

        /// Right document
        #[arg(value_name = "RIGHT")]
        right: PathBuf,

        /// Ignore this path and everything beneath it (repeatable)
        #[arg(short, long, value_name = "PATH")]
        exclude: Vec<String>,

        /// Output the diff as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Inspect { file, json } => cmd_inspect(file, json),
        Commands::Save {
            file,
            output,
            config,
            alphabetical,
            delete,
        } => cmd_save(file, output, config, alphabetical, delete),
        Commands::Tag { tags } => cmd_tag(tags),
        Commands::DiffJson {
            left,
            right,
            exclude,
            json,
        } => cmd_diff_json(left, right, exclude, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install a stderr subscriber; `RUST_LOG` wins over the `-v` count
#[cfg(feature = "cli")]
fn init_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,fieldmap={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(feature = "cli")]
fn cmd_inspect(file: PathBuf, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let xml = fs::read_to_string(&file)?;
    let session = MappingSession::from_xml(&xml, EditorConfig::default())?;

    if json {
        println!("{}", serde_json::to_string_pretty(session.entries())?);
        return Ok(());
    }

    println!("fieldmap v{}", fieldmap::VERSION);
    println!("{}: {} entries", file.display(), session.len());
    println!();
    for entry in session.entries() {
        print_entry(entry);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn print_entry(entry: &MappingEntry) {
    print!("  {} : {}", entry.field_name, entry.mapping_type);
    if entry.mapping_type.uses_source() {
        print!(" <- {} ({})", entry.source, fix_fields::field_name_for(&entry.source));
    }
    if let Some(table) = &entry.mapped_data {
        match table {
            MappedTable::Direct(table) => {
                print!(" [{} source(s), {} row(s)]", table.sources().len(), table.rows().len())
            }
            MappedTable::Conditional { branches } => print!(" [{} branch(es)]", branches.len()),
        }
    }
    if let Some(derived) = &entry.derived_mapping {
        print!(" [{} condition set(s)]", derived.condition_sets().len());
    }
    if let Some(status) = &entry.status {
        print!(" {{{}}}", status);
    }
    println!();
    if !entry.tickets.is_empty() {
        println!("      tickets: {}", entry.tickets.iter().collect::<Vec<_>>().join(", "));
    }
}

#[cfg(feature = "cli")]
fn cmd_save(
    file: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    alphabetical: bool,
    delete: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match config {
        Some(path) => EditorConfig::from_file(path)?,
        None => EditorConfig::default(),
    };
    if alphabetical {
        config = config.with_order_preference(OrderPreference::Alphabetical);
    }

    let xml = fs::read_to_string(&file)?;
    let mut session = MappingSession::from_xml(&xml, config)?;

    for name in &delete {
        let index = session
            .entries()
            .iter()
            .position(|e| &e.field_name == name)
            .ok_or_else(|| format!("no entry named '{}'", name))?;
        session.delete_entry(index)?;
    }

    let exported = session.export()?;
    match output {
        Some(path) => {
            fs::write(&path, exported)?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", exported),
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_tag(tags: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    for tag in tags {
        println!("{}\t{}", tag, fix_fields::field_name_for(&tag));
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_diff_json(
    left: PathBuf,
    right: PathBuf,
    exclude: Vec<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let exclusions: ExclusionList = exclude.into_iter().collect();
    let diff = json_diff::compare_str(
        &fs::read_to_string(&left)?,
        &fs::read_to_string(&right)?,
        &exclusions,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
        return Ok(());
    }

    println!("Only in {}: {}", left.display(), diff.only_in_left.len());
    for path in &diff.only_in_left {
        println!("  - {}", path);
    }
    println!("Only in {}: {}", right.display(), diff.only_in_right.len());
    for path in &diff.only_in_right {
        println!("  + {}", path);
    }
    println!("Different values: {}", diff.different_values.len());
    for difference in &diff.different_values {
        println!("  ~ {}: {} != {}", difference.path, difference.left, difference.right);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
