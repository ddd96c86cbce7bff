//! Template Composer CLI
//!
//! Usage:
//!   template-composer [OPTIONS] <REQUEST>
//!
//! Options:
//!   -c, --config <FILE>         Configuration file (TOML format)
//!   --layouts/--views/--partials <DIR>
//!                               Template directories
//!   -d, --data <FILE>           JSON data, `-` for stdin
//!   --explain                   Print the composed set instead of output
//!   -v                          More logging (repeatable)
//!   -h, --help                  Print help

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use template_composer::{
    CacheMode, ComposeError, Composer, ComposerConfig, Composition, TemplateError,
};

#[derive(Parser)]
#[command(name = "template-composer")]
#[command(about = "Compose layouts, views and partials into one template")]
struct Cli {
    /// Composition request, e.g. `base=site,profile`
    request: String,

    /// Configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Layouts directory
    #[arg(long)]
    layouts: Option<PathBuf>,

    /// Views directory
    #[arg(long)]
    views: Option<PathBuf>,

    /// Partials directory
    #[arg(long)]
    partials: Option<PathBuf>,

    /// Template file extension, e.g. `.tmpl`
    #[arg(long)]
    ext: Option<String>,

    /// Name templates without their extension
    #[arg(long)]
    strip_ext: bool,

    /// Layout used when the request names none
    #[arg(long)]
    default_layout: Option<String>,

    /// Re-read templates on every composition instead of preloading
    #[arg(long)]
    dynamic: bool,

    /// JSON data file, `-` reads from stdin
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Print the composed template set instead of executing it
    #[arg(long)]
    explain: bool,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let data = match read_data(cli.data.as_ref()) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error reading data: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, config, &data) {
        report(&e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<ComposerConfig, ComposeError> {
    let mut config = match &cli.config {
        Some(path) => ComposerConfig::from_file(path)?,
        None => ComposerConfig::new(),
    };

    if let Some(dir) = &cli.layouts {
        config = config.with_layouts_dir(dir);
    }
    if let Some(dir) = &cli.views {
        config = config.with_views_dir(dir);
    }
    if let Some(dir) = &cli.partials {
        config = config.with_partials_dir(dir);
    }
    if let Some(ext) = &cli.ext {
        config = config.with_template_ext(ext);
    }
    if cli.strip_ext {
        config = config.with_strip_ext(true);
    }
    if let Some(layout) = &cli.default_layout {
        config = config.with_default_layout(layout);
    }
    if cli.dynamic {
        config = config.with_cache_mode(CacheMode::None);
    }
    Ok(config)
}

fn read_data(path: Option<&PathBuf>) -> Result<Value, Box<dyn std::error::Error>> {
    let text = match path {
        None => return Ok(Value::Null),
        Some(p) if p.as_os_str() == "-" => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        Some(p) => fs::read_to_string(p)?,
    };
    Ok(serde_json::from_str(&text)?)
}

fn run(cli: &Cli, config: ComposerConfig, data: &Value) -> Result<(), ComposeError> {
    let composer = Composer::new(config)?;

    if cli.explain {
        let composition = composer.compose(&cli.request)?;
        print!("{}", explain(&composition));
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    composer.execute(&mut stdout, &cli.request, data)?;
    stdout.flush().map_err(template_composer::ExecError::from)?;
    Ok(())
}

fn explain(composition: &Composition) -> String {
    let set = &composition.set;
    let resolution = &composition.resolution;
    let mut out = format!("root: {}\nmembers:\n", set.root_name());
    for name in set.names() {
        out.push_str(&format!("  {}\n", name));
    }
    out.push_str(&format!("passes: {}\n", resolution.passes));
    for (label, names) in [
        ("associated", &resolution.associated),
        ("resolved", &resolution.resolved),
        ("defaulted", &resolution.defaulted),
    ] {
        if !names.is_empty() {
            out.push_str(&format!("{}: {}\n", label, names.join(", ")));
        }
    }
    out
}

fn report(error: &ComposeError) {
    if let ComposeError::Template(e @ TemplateError::Parse { .. }) = error {
        if let Some(rendered) = e.report() {
            eprintln!("{}", rendered);
            return;
        }
    }
    eprintln!("Error: {}", error);
}
