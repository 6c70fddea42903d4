//! Mirrorplan CLI - manage backup mappings, generate run scripts, summarize logs

use clap::{Parser, Subcommand};
use mirrorplan::model::SettingKey;
use mirrorplan::storage::SettingsStore;
use mirrorplan::{report, script};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "mirrorplan")]
#[command(version = "0.1.0")]
#[command(about = "Backup mirroring planner - robocopy script generation and run-log reports")]
#[command(long_about = r#"
Mirrorplan keeps a persistent map of backup source directories to their
mirror targets, renders it into a robocopy batch script, and summarizes
the unified run log:
  • Register source directories and per-source mirror targets
  • Generate a script: one ROBOCOPY command per (source, target) pair,
    all writing into one unified log
  • Classify the unified log into a grouped report

Example usage:
  mirrorplan add-source /data/photos
  mirrorplan add-target /data/photos /mnt/backup/photos
  mirrorplan set-output backup.cmd
  mirrorplan set-log backup.log
  mirrorplan generate
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a source directory
    AddSource {
        /// Directory whose contents are to be mirrored
        path: PathBuf,

        /// Path to the settings database
        #[arg(short, long, default_value = "mirrorplan.db")]
        database: PathBuf,
    },

    /// Remove a source and every target it owns
    RemoveSource {
        /// Stored source path, as shown by `sources`
        path: String,

        /// Path to the settings database
        #[arg(short, long, default_value = "mirrorplan.db")]
        database: PathBuf,
    },

    /// Associate a target directory with a registered source
    AddTarget {
        /// Stored source path, as shown by `sources`
        source: String,

        /// Directory that receives the mirror
        target: PathBuf,

        /// Path to the settings database
        #[arg(short, long, default_value = "mirrorplan.db")]
        database: PathBuf,
    },

    /// Remove a single target
    RemoveTarget {
        /// Stored target path, as shown by `targets`
        path: String,

        /// Path to the settings database
        #[arg(short, long, default_value = "mirrorplan.db")]
        database: PathBuf,
    },

    /// List registered sources
    Sources {
        /// Path to the settings database
        #[arg(short, long, default_value = "mirrorplan.db")]
        database: PathBuf,
    },

    /// List the targets of one source
    Targets {
        /// Stored source path, as shown by `sources`
        source: String,

        /// Path to the settings database
        #[arg(short, long, default_value = "mirrorplan.db")]
        database: PathBuf,
    },

    /// List every (source, target) pair in generation order
    Pairs {
        /// Path to the settings database
        #[arg(short, long, default_value = "mirrorplan.db")]
        database: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the configured script output and log locations
    Config {
        /// Path to the settings database
        #[arg(short, long, default_value = "mirrorplan.db")]
        database: PathBuf,
    },

    /// Set where the generated batch script is written
    SetOutput {
        /// Output script path
        path: String,

        /// Path to the settings database
        #[arg(short, long, default_value = "mirrorplan.db")]
        database: PathBuf,
    },

    /// Set the unified log location the generated script writes to
    SetLog {
        /// Unified log path
        path: String,

        /// Path to the settings database
        #[arg(short, long, default_value = "mirrorplan.db")]
        database: PathBuf,
    },

    /// Generate the robocopy batch script from the stored mapping
    Generate {
        /// Path to the settings database
        #[arg(short, long, default_value = "mirrorplan.db")]
        database: PathBuf,
    },

    /// Classify a unified run log into a report file
    Analyze {
        /// The unified log written by a generated script run
        logfile: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::AddSource { path, database } => {
            let store = SettingsStore::open(&database)?;
            store.add_source(&path)?;

            // adds absorb bad paths silently, so re-query to report the effect
            let resolved = std::fs::canonicalize(&path).ok();
            let sources = store.list_sources()?;
            match resolved {
                Some(r) if sources.iter().any(|s| s.path == r.to_string_lossy().as_ref()) => {
                    println!("✅ Source registered: {}", r.display());
                }
                _ => println!("∅ Ignored, not an existing directory: {}", path.display()),
            }
        }

        Commands::RemoveSource { path, database } => {
            let store = SettingsStore::open(&database)?;
            store.remove_source(&path)?;
            println!("✅ Source removed (with its targets): {}", path);
        }

        Commands::AddTarget { source, target, database } => {
            let store = SettingsStore::open(&database)?;
            store.add_target(&source, &target)?;

            let resolved = std::fs::canonicalize(&target).ok();
            let targets = store.list_targets(&source)?;
            match resolved {
                Some(r) if targets.iter().any(|t| t.path == r.to_string_lossy().as_ref()) => {
                    println!("✅ Target registered: {} -> {}", source, r.display());
                }
                _ => println!("∅ Ignored, not an existing directory: {}", target.display()),
            }
        }

        Commands::RemoveTarget { path, database } => {
            let store = SettingsStore::open(&database)?;
            store.remove_target(&path)?;
            println!("✅ Target removed: {}", path);
        }

        Commands::Sources { database } => {
            let store = SettingsStore::open(&database)?;
            let sources = store.list_sources()?;

            if sources.is_empty() {
                println!("∅ No sources registered.");
            } else {
                for source in sources {
                    println!("{}", source.path);
                }
            }
        }

        Commands::Targets { source, database } => {
            let store = SettingsStore::open(&database)?;
            let targets = store.list_targets(&source)?;

            if targets.is_empty() {
                println!("∅ No targets for: {}", source);
            } else {
                for target in targets {
                    println!("{}", target.path);
                }
            }
        }

        Commands::Pairs { database, format } => {
            let store = SettingsStore::open(&database)?;
            let pairs = store.list_pairs()?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&pairs)?);
            } else if pairs.is_empty() {
                println!("∅ No (source, target) pairs.");
            } else {
                for pair in pairs {
                    println!("{} -> {}", pair.source_path, pair.target_path);
                }
            }
        }

        Commands::Config { database } => {
            let store = SettingsStore::open(&database)?;
            let output = store.get_setting(SettingKey::OutputScript)?;
            let log = store.get_setting(SettingKey::LogFile)?;

            println!("Output script: {}", output.as_deref().unwrap_or("-not set-"));
            println!("Unified log:   {}", log.as_deref().unwrap_or("-not set-"));
        }

        Commands::SetOutput { path, database } => {
            let store = SettingsStore::open(&database)?;
            store.set_setting(SettingKey::OutputScript, &path)?;
            println!("✅ Output script location set: {}", path);
        }

        Commands::SetLog { path, database } => {
            let store = SettingsStore::open(&database)?;
            store.set_setting(SettingKey::LogFile, &path)?;
            println!("✅ Unified log location set: {}", path);
        }

        Commands::Generate { database } => {
            let store = SettingsStore::open(&database)?;
            let analyzer = std::env::current_exe()?;
            let pair_count = store.list_pairs()?.len();

            let written = script::generate_script(&store, &analyzer)?;
            println!("🚀 Generated {} copy command(s)", pair_count);
            println!("✅ Script written to: {}", written.display());
        }

        Commands::Analyze { logfile } => {
            let (report_file, report) = report::analyze_log(&logfile)?;

            println!("📊 Classified {} line(s):", report.len());
            println!("   Modified:  {}", report.modified.len());
            println!("   Newer:     {}", report.newer.len());
            println!("   New files: {}", report.new_files.len());
            println!("   New dirs:  {}", report.new_dirs.len());
            println!("✅ Report written to: {}", report_file.display());
        }
    }

    Ok(())
}
