use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use pathwatch::{
    EventKinds, FileWatcherManager, FnProcessor, LogProcessor, ManagerResponse, Settings,
};

#[derive(Parser)]
#[command(name = "pathwatch")]
#[command(about = "Watch a path for file system changes")]
struct Cli {
    /// Path to watch
    path: PathBuf,

    /// Include all subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Exit after the first batch of changes
    #[arg(long)]
    once: bool,

    /// Event kinds to watch (create, modify, delete, overflow)
    #[arg(short, long, value_delimiter = ',', default_values_t = [
        "create".to_string(), "modify".to_string(), "delete".to_string()
    ])]
    events: Vec<String>,

    /// Emit events as JSON lines instead of log output
    #[arg(long)]
    json: bool,
}

fn parse_kinds(names: &[String]) -> anyhow::Result<EventKinds> {
    let mut kinds = EventKinds::empty();
    for name in names {
        kinds |= match name.as_str() {
            "create" => EventKinds::CREATE,
            "modify" => EventKinds::MODIFY,
            "delete" => EventKinds::DELETE,
            "overflow" => EventKinds::OVERFLOW,
            other => anyhow::bail!("unknown event kind: {other}"),
        };
    }
    Ok(kinds)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("loading settings")?;
    pathwatch::logging::init_with_config(&settings.logging);

    let kinds = parse_kinds(&cli.events)?;
    let recursive = cli.recursive || settings.watch.recursive;
    // Interactive watching defaults to infinite; --once stops after one batch
    let infinite = !cli.once;

    let manager = FileWatcherManager::new();

    let mut builder = pathwatch::FileWatcher::builder()
        .watch(&cli.path)
        .for_events(kinds)
        .recursive(recursive)
        .infinite(infinite);

    builder = if cli.json {
        builder.processor(FnProcessor::new("json", |batch: &[pathwatch::ChangeEvent]| {
            for event in batch {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::error!("[json] serialize failed: {e}"),
                }
            }
        }))
    } else {
        builder.processor(LogProcessor::new())
    };

    let (config, watcher) = builder.build().context("building watcher")?;
    manager.register(config, watcher);

    match manager.start_watching(&cli.path)? {
        ManagerResponse::Watching => {
            pathwatch::log_event!("manager", "watching", "{}", cli.path.display());
        }
        other => anyhow::bail!("could not start watching {}: {other:?}", cli.path.display()),
    }

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;

    for (path, response) in manager.stop_all() {
        pathwatch::log_event!("manager", "stopped", "{} -> {response:?}", path.display());
    }

    Ok(())
}
