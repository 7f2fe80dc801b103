use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use elflint_core::config::Config;
use elflint_core::package::Package;
use elflint_core::report::{model::ToolInfo, render};
use elflint_core::rules::catalog;
use elflint_core::rules::classify::Mode;
use elflint_core::{TOOL_NAME, inspect_package};

mod args;

use args::{AnalysisArgs, Command, OutputFormat};

fn main() -> Result<()> {
    let args = args::Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Check {
            root,
            package,
            analysis,
        } => {
            let package = Package::from_dir(&root, package)
                .with_context(|| format!("failed to read package tree {}", root.display()))?;
            run(&package, &analysis)
        }
        Command::File {
            path,
            logical,
            package,
            analysis,
        } => {
            let logical = logical.unwrap_or_else(|| path.display().to_string());
            run(&Package::single(package, path, logical), &analysis)
        }
        Command::Explain { rules } => {
            for name in rules {
                match catalog::explain(&name) {
                    Some(text) => println!("{name}:\n{text}\n"),
                    None => println!("{name}:\nUnknown message.\n"),
                }
            }
            Ok(())
        }
        Command::PrintConfig { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "elflint=warn,elflint_core=warn",
        1 => "elflint=info,elflint_core=info",
        _ => "elflint=debug,elflint_core=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn run(package: &Package, analysis: &AnalysisArgs) -> Result<()> {
    let mut config = load_config(analysis.config.as_deref())?;
    if let Some(readelf) = &analysis.readelf {
        config.readelf = readelf.clone();
    }
    if let Some(timeout) = analysis.timeout {
        config.timeout_secs = timeout;
    }
    config.disabled_rules.extend(analysis.disabled.iter().cloned());

    let mode = if analysis.strict {
        Mode::Strict
    } else if analysis.permissive {
        Mode::Permissive
    } else {
        Mode::Default
    };
    debug!(
        ?mode,
        readelf = %config.readelf.display(),
        disabled = ?config.disabled_rules,
        "configuration resolved"
    );

    let tool = ToolInfo {
        name: TOOL_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        readelf: config.readelf.display().to_string(),
    };

    let report = inspect_package(package, tool, &config, mode)
        .with_context(|| format!("failed to inspect package {}", package.name))?;

    let output = match analysis.format {
        OutputFormat::Json => render::render_json(&report)?,
        OutputFormat::Text => render::render_text(&report),
    };

    match &analysis.out {
        Some(path) => write_output(path, &output)?,
        None => print!("{output}"),
    }

    std::process::exit(report.verdict.exit_code);
}

fn write_output(path: &Path, output: &str) -> Result<()> {
    std::fs::write(path, output).with_context(|| format!("failed to write {}", path.display()))
}
