use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use isle_wm::actor;
use isle_wm::actor::config_watcher::{self, ConfigWatcher};
use isle_wm::actor::placer::{self, Placer};
use isle_wm::common::config::{self, Config, ConfigError, SharedConfig};
use isle_wm::model::SlotIndex;
use isle_wm::model::scenario::Scenario;
use isle_wm::model::server::SlotData;
use isle_wm::sys::virtual_host::VirtualHost;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

#[derive(Parser)]
#[command(name = "isle", version, about = "Give selected applications a workspace of their own")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a scenario against an in-memory window system and print the
    /// resulting slots.
    Replay {
        scenario: PathBuf,
        /// Use this configuration file instead of the one in the scenario.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Tree)]
        format: Format,
    },
    /// Run the placer on a scenario's starting slots, reloading the
    /// configuration file whenever it changes. Prints the slots on Ctrl-C.
    Watch {
        scenario: PathBuf,
        /// Defaults to the user configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Tree)]
        format: Format,
    },
    /// Validate a configuration file.
    CheckConfig {
        /// Defaults to the user configuration file.
        path: Option<PathBuf>,
    },
    /// Print the built-in default configuration.
    PrintDefaultConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Tree,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("isle: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    Registry::default()
        .with(filter)
        .with(
            HierarchicalLayer::default()
                .with_writer(std::io::stderr)
                .with_indent_lines(true)
                .with_targets(true)
                .with_deferred_spans(true),
        )
        .init();
}

fn run(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Replay { scenario, config, format } => {
            let mut scenario = Scenario::read(&scenario)?;
            if let Some(path) = config {
                scenario.config = config_watcher::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?;
            }
            let slots = placer::replay(&scenario).context("replaying scenario")?;
            print_slots(&slots, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Watch { scenario, config, format } => {
            let scenario = Scenario::read(&scenario)?;
            let path = config.unwrap_or_else(config::config_file);
            let slots = watch(&scenario, path)?;
            print_slots(&slots, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::CheckConfig { path } => {
            let path = path.unwrap_or_else(config::config_file);
            let config = match Config::read(&path) {
                Ok(config) => config,
                Err(err) if !path.exists() => {
                    eprintln!("{}: {}", path.display(), ConfigError::Unavailable);
                    tracing::debug!("{err:#}");
                    return Ok(ExitCode::FAILURE);
                }
                Err(err) => return Err(err),
            };
            let issues = config.validate();
            if issues.is_empty() {
                println!("{}: ok ({} apps)", path.display(), config.apps.len());
                return Ok(ExitCode::SUCCESS);
            }
            for issue in &issues {
                println!("{}: {issue}", path.display());
            }
            Ok(ExitCode::FAILURE)
        }
        Command::PrintDefaultConfig => {
            print!("{}", Config::default_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn watch(scenario: &Scenario, path: PathBuf) -> anyhow::Result<Vec<SlotData>> {
    let config = config_watcher::load(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    let shared = SharedConfig::new(config);

    let mut host = VirtualHost::new(scenario.slots)
        .with_primary_output(scenario.primary_output)
        .with_active_slot(SlotIndex::new(scenario.active_slot));
    for window in &scenario.windows {
        host.insert_window(window.to_info());
    }
    let mut placer = Placer::new(host, shared.clone());
    placer.enable()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;
    runtime.block_on(async move {
        let (events_tx, events) = actor::channel();
        let _watcher = ConfigWatcher::spawn(path, shared, events_tx)?;
        let shutdown = CancellationToken::new();

        let (placer, ()) = tokio::join!(placer.run(events, shutdown.clone()), async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!(%err, "cannot listen for Ctrl-C");
            }
            shutdown.cancel();
        });
        anyhow::Ok(placer.snapshot())
    })
}

fn print_slots(slots: &[SlotData], format: Format) -> anyhow::Result<()> {
    let out = match format {
        Format::Json => serde_json::to_string_pretty(slots)?,
        Format::Tree => draw_tree(slots)?,
    };
    writeln!(std::io::stdout(), "{out}")?;
    Ok(())
}

fn draw_tree(slots: &[SlotData]) -> anyhow::Result<String> {
    let children = slots
        .iter()
        .map(|slot| {
            let marker = if slot.is_active { "*" } else { "" };
            let desc = format!("#{}{marker} ({} windows)", slot.index, slot.window_count);
            let windows: Vec<String> = slot.windows.iter().map(|w| w.label()).collect();
            if windows.is_empty() {
                ascii_tree::Tree::Leaf(vec![desc])
            } else {
                ascii_tree::Tree::Node(desc, vec![ascii_tree::Tree::Leaf(windows)])
            }
        })
        .collect();
    let tree = ascii_tree::Tree::Node("slots".to_string(), children);
    let mut out = String::new();
    ascii_tree::write_tree(&mut out, &tree)?;
    Ok(out)
}
