//! gamess-log command-line interface
//!
//! # Usage
//!
//! 1. **Settings template** (`gamess-log ci gamess_log.cfg`):
//!    Writes a commented configuration file with the defaults
//!
//! 2. **Parse a log** (`gamess-log <file.log>`):
//!    Parses the file, prints a summary and the warnings found, and writes
//!    `<stem>.json` / `<stem>.xyz` when enabled in the `[output]` section
//!
//! # Examples
//!
//! ```bash
//! gamess-log ci gamess_log.cfg
//! gamess-log water.log
//! RUST_LOG=debug gamess-log water.log
//! ```

use gamess_log::parser::{GamessLog, ParsedLog};
use gamess_log::settings::{Settings, SettingsManager, CONFIG_FILE_NAME};
use gamess_log::snapshot::MoleculeSnapshot;
use gamess_log::{io, molecule::Molecule};
use log::{error, info, LevelFilter};
use std::env;
use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("gamess-log");
    if args.len() < 2 {
        print_usage(program);
        process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "-h" | "--help" => print_usage(program),
        "ci" => {
            init_console_logger(LevelFilter::Info);
            let Some(file_arg) = args.get(2) else {
                eprintln!("Error: Missing file argument");
                eprintln!("Usage: {} ci {}", program, CONFIG_FILE_NAME);
                process::exit(1);
            };
            if file_arg != CONFIG_FILE_NAME {
                eprintln!("Error: the settings template must be named {}", CONFIG_FILE_NAME);
                process::exit(1);
            }
            match SettingsManager::create_template(Path::new(file_arg)) {
                Ok(()) => {
                    println!("Settings template created: {}", file_arg);
                    println!("Edit it and rerun gamess-log; it is loaded automatically.");
                }
                Err(e) => {
                    eprintln!("Error creating settings template: {}", e);
                    process::exit(1);
                }
            }
        }
        _ if command.starts_with('-') => {
            eprintln!("Error: Unknown option: {}", command);
            print_usage(program);
            process::exit(1);
        }
        _ => {
            if let Err(e) = run(Path::new(command)) {
                error!("{}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("gamess-log - GAMESS output reader");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {} <file.log>", program);
    eprintln!("                    Parse a GAMESS log and print a summary");
    eprintln!("  {} ci {}", program, CONFIG_FILE_NAME);
    eprintln!("                    Create a settings template");
}

fn init_console_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .target(env_logger::Target::Stdout)
        .format_timestamp_millis()
        .init();
}

/// Console logging, or `gamess_log_<stem>.log` when file logging is on.
fn init_logger(settings: &Settings, input: &Path) -> Result<(), Box<dyn Error>> {
    let level = settings.logging.level_filter();
    if !settings.logging.file_logging {
        init_console_logger(level);
        return Ok(());
    }

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("job");
    let log_file = format!("gamess_log_{}.log", stem);
    let file = File::create(&log_file)
        .map_err(|e| format!("Failed to create log file {}: {}", log_file, e))?;

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .init();
    println!("Logging to {}", log_file);
    Ok(())
}

fn run(input: &Path) -> Result<(), Box<dyn Error>> {
    let (settings, source) = match SettingsManager::load() {
        Ok(manager) => (
            manager.settings().clone(),
            manager.config_source().to_string(),
        ),
        Err(e) => {
            eprintln!("Warning: failed to load settings ({}), using defaults", e);
            (Settings::default(), "built-in defaults".to_string())
        }
    };
    init_logger(&settings, input)?;
    info!("Configuration loaded from: {}", source);

    // parse() reports why a log that is not ready was rejected
    let parsed = GamessLog::with_extension(input, &settings.parser.extension).parse()?;
    print_summary(&parsed);

    let stem = input.with_extension("");
    if settings.output.json {
        let path = stem.with_extension("json");
        MoleculeSnapshot::from(&parsed.molecule).save(&path)?;
        println!("Snapshot written to {}", path.display());
    }
    if settings.output.xyz {
        let path = stem.with_extension("xyz");
        io::write_xyz(&parsed.molecule, &path)?;
        println!("Geometry written to {}", path.display());
    }
    Ok(())
}

fn print_summary(parsed: &ParsedLog) {
    let mol: &Molecule = &parsed.molecule;

    println!("{}", "=".repeat(60));
    println!("Molecule:          {}", mol.name);
    println!("Atoms:             {}", mol.atom_count());
    println!("AO count:          {}", mol.aonum);
    println!("Electrons:         {}", mol.electrons);
    println!("Total energy:      {:.6} eV", mol.total_energy);
    if let Some(homo) = mol.homo {
        println!("HOMO:              {} ({:.4} eV)", homo.number, homo.energy);
    }
    if let Some(lumo) = mol.lumo {
        println!("LUMO:              {} ({:.4} eV)", lumo.number, lumo.energy);
    }
    println!(
        "Wavefunction:      {}{}",
        if mol.open_shell { "open shell" } else { "closed shell" },
        if mol.tight_binding { ", tight-binding" } else { "" }
    );
    println!("{}", "=".repeat(60));

    if !parsed.warnings.is_empty() {
        println!("{} warnings:", parsed.warnings.len());
        for warning in &parsed.warnings {
            println!("  - {}", warning);
        }
    }
}
