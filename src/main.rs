//! Engine Router CLI
//!
//! Usage:
//!   engine-router [OPTIONS] <MANIFEST>
//!
//! Options:
//!   -u, --url <URL>          URL to visit [default: /]
//!       --html               Print markup instead of text
//!       --no-render          Run hooks without rendering
//!       --log-level <LEVEL>  Log filter when RUST_LOG is unset [default: warn]
//!   -h, --help               Print help

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use engine_router::{Manifest, VisitOptions};

#[derive(Parser)]
#[command(name = "engine-router")]
#[command(about = "Visit a URL in an application described by a TOML manifest")]
struct Cli {
    /// Application manifest (TOML format)
    manifest: PathBuf,

    /// URL to visit
    #[arg(short, long, default_value = "/")]
    url: String,

    /// Print rendered markup instead of text content
    #[arg(long)]
    html: bool,

    /// Run route hooks without rendering
    #[arg(long)]
    no_render: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let manifest = match Manifest::from_file(&cli.manifest) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error loading manifest '{}': {}", cli.manifest.display(), e);
            std::process::exit(1);
        }
    };

    let mut app = match manifest.into_application() {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{}", e.report());
            std::process::exit(1);
        }
    };

    let options = VisitOptions::new().with_should_render(!cli.no_render);
    if let Err(e) = app.visit_and_settle(&cli.url, options) {
        // Error substates still render; show them before reporting
        print_output(&app, cli.html);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    print_output(&app, cli.html);
    if let Some(url) = app.current_url() {
        tracing::info!(%url, "visited");
    }
}

fn print_output(app: &engine_router::Application, html: bool) {
    let output = if html { app.html() } else { app.text() };
    if !output.is_empty() {
        println!("{}", output);
    }
}
