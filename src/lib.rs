// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;
use crate::config::validate::validate_ignore_entries;
use crate::engine::{RunState, Runtime, WatchCore};
use crate::errors::{ChainwatchError, Result};
use crate::exec::{ChainBuilder, OutputSink, StdoutSink};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::{IgnoreSet, NotifyBackend};

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading (+ CLI overrides)
/// - the output sink and chain template
/// - watcher, watch core and run state
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<i32> {
    let mut cfg = load_and_validate(&args.config)?;
    apply_overrides(&mut cfg, &args)?;

    let fs = RealFileSystem;
    let root = resolve_root(&fs, &args.config, &cfg, args.root.as_deref())?;

    if args.dry_run {
        print_dry_run(&cfg, &root);
        return Ok(0);
    }

    let template = chain_template(&cfg)?;
    let sink: Arc<dyn OutputSink> = Arc::new(StdoutSink::new(cfg.watch.clear_screen));

    if args.once {
        let result = template
            .build()
            .execute(sink.as_ref())
            .await
            .map_err(|e| ChainwatchError::Other(e.into()))?;
        return Ok(if result.succeeded() { 0 } else { 1 });
    }

    let (backend, streams) = NotifyBackend::new()?;
    let ignore = IgnoreSet::new(&root, &cfg.ignore)?;
    let core = WatchCore::new(&root, Arc::new(fs), Box::new(backend), ignore)
        .with_content_hashing(cfg.watch.use_hash);
    let run_state = Arc::new(RunState::new(template, sink));

    let (runtime, shutdown) = Runtime::new(core, run_state, streams);

    // Ctrl-C → graceful shutdown.
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        shutdown.close();
    });

    runtime.run().await?;
    Ok(0)
}

/// Build the chain every trigger instantiates.
pub fn chain_template(cfg: &ConfigFile) -> Result<ChainBuilder> {
    let builder = ChainBuilder::from_specs(cfg.commands().iter().cloned())
        .map_err(|e| ChainwatchError::ConfigError(e.to_string()))?;
    Ok(builder.verbose(cfg.verbose).kill_policy(cfg.kill_policy()))
}

/// Merge command-line flags into a loaded config. `--ignore` entries obey
/// the same rules as the config file's `ignore` list.
pub fn apply_overrides(cfg: &mut ConfigFile, args: &CliArgs) -> Result<()> {
    validate_ignore_entries(&args.ignore)?;
    cfg.verbose |= args.verbose;
    cfg.ignore.extend(args.ignore.iter().cloned());
    Ok(())
}

/// Work out the watch root, canonicalized.
///
/// Order: `--root`, then `[watch].root` resolved against the config file's
/// directory, then the config file's directory itself.
pub fn resolve_root(
    fs: &dyn FileSystem,
    config_path: &Path,
    cfg: &ConfigFile,
    cli_root: Option<&Path>,
) -> Result<PathBuf> {
    let root = match (cli_root, cfg.watch.root.as_deref()) {
        (Some(root), _) => root.to_path_buf(),
        (None, Some(root)) if root.is_absolute() => root.to_path_buf(),
        (None, Some(root)) => config_root_dir(config_path).join(root),
        (None, None) => config_root_dir(config_path),
    };

    let root = fs
        .canonicalize(&root)
        .map_err(|_| ChainwatchError::InvalidRoot(root.clone()))?;
    match fs.stat(&root) {
        Ok(stat) if stat.is_dir => {}
        _ => return Err(ChainwatchError::InvalidRoot(root)),
    }
    debug!(?root, "resolved watch root");
    Ok(root)
}

/// Directory containing the config file, or the working directory for a
/// bare file name.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_dry_run(cfg: &ConfigFile, root: &Path) {
    println!("chainwatch dry-run");
    println!("  root = {}", root.display());
    println!("  verbose = {}", cfg.verbose);
    println!("  use_hash = {}", cfg.watch.use_hash);
    if !cfg.ignore.is_empty() {
        println!("  ignore = {:?}", cfg.ignore);
    }
    println!();

    println!("script ({}):", cfg.commands().len());
    for (i, cmd) in cfg.commands().iter().enumerate() {
        println!("  {}. {cmd}", i + 1);
    }

    info!("dry-run complete (no execution)");
}
