use std::fs;

use anyhow::{Context, Result};
use democonfig::{DemoConfig, DemoSource};
use renderer::{run_windowed, validate_wgsl, CancellationToken, Preset, ShaderContract};
use tracing_subscriber::EnvFilter;

use crate::bootstrap::build_renderer_config;
use crate::cli::{CheckArgs, Cli, Command, RunArgs};
use crate::paths::AppPaths;

pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Some(Command::List) => list(&cli.run),
        Some(Command::Check(args)) => check(args),
        None => run_demo(&cli.run),
    }
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads `--config` (which must exist) or the default config file if present.
fn load_demo_config(args: &RunArgs) -> Result<Option<DemoConfig>> {
    if let Some(path) = &args.config {
        let config = DemoConfig::load(path)
            .with_context(|| format!("failed to load demo config {}", path.display()))?;
        tracing::debug!(path = %path.display(), demos = config.demos.len(), "loaded demo config");
        return Ok(Some(config));
    }

    let paths = match AppPaths::discover() {
        Ok(paths) => paths,
        Err(err) => {
            tracing::debug!(error = %err, "no config directory; using bundled presets only");
            return Ok(None);
        }
    };
    let path = paths.default_config_file();
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no demo config file");
        return Ok(None);
    }

    let config = DemoConfig::load(&path)
        .with_context(|| format!("failed to load demo config {}", path.display()))?;
    tracing::debug!(path = %path.display(), demos = config.demos.len(), "loaded demo config");
    Ok(Some(config))
}

fn run_demo(args: &RunArgs) -> Result<()> {
    let demos = load_demo_config(args)?;
    let config = build_renderer_config(args, demos.as_ref())?;
    tracing::info!(
        demo = %config.title,
        mode = %config.mode,
        "starting raymarch demo"
    );

    let token = CancellationToken::new();
    let report = run_windowed(config, token)?;
    tracing::info!(
        frames = report.frames(),
        skipped = report.skipped,
        fps = report.fps,
        "demo finished"
    );
    Ok(())
}

fn list(args: &RunArgs) -> Result<()> {
    println!("presets:");
    for preset in Preset::all() {
        println!(
            "  {:<14} {:<12} {}",
            preset.name,
            preset.mode.to_string(),
            preset.description
        );
    }

    if let Some(demos) = load_demo_config(args)? {
        if !demos.demos.is_empty() {
            println!("configured demos:");
        }
        for name in demos.demos.keys() {
            let Some(resolved) = demos.resolve(name) else {
                continue;
            };
            let source = match &resolved.source {
                DemoSource::Preset(preset) => format!("preset {preset}"),
                DemoSource::Shader(path) => format!("shader {}", path.display()),
            };
            let marker = if demos.default_demo() == Some(name.as_str()) {
                " (default)"
            } else {
                ""
            };
            println!("  {name:<14} {source}{marker}");
        }
    }
    Ok(())
}

fn check(args: &CheckArgs) -> Result<()> {
    let source = fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read shader {}", args.path.display()))?;
    let contract = if args.feedback {
        ShaderContract::Feedback
    } else {
        ShaderContract::Direct
    };

    let interface = validate_wgsl(&source, contract)
        .with_context(|| format!("{} failed {contract} validation", args.path.display()))?;

    let overrides = if interface.overrides().is_empty() {
        "none".to_string()
    } else {
        interface.overrides().join(", ")
    };
    println!(
        "ok: {} satisfies the {contract} layout (overrides: {overrides})",
        args.path.display()
    );
    Ok(())
}
