//! # signature-render
//!
//! Renders an element list to a PNG signature.
//!
//! ## Usage
//!
//! ```bash
//! # Render elements.json to signature.png using fonts from ./fonts
//! signature-render --input elements.json --output signature.png --font-dir ./fonts
//!
//! # Lower resolution, rewriting localhost image URLs
//! signature-render -i elements.json -o out.png --scale 2 --public-base-url https://api.example.com
//! ```
//!
//! The input is either a bare JSON array of elements or `{ "elements": [...] }`.
//! Set `RUST_LOG=debug` for pipeline details.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use signature_renderer::{FontRegistry, RenderConfig, RenderError, RenderRequest, SignatureRenderer};

/// Signature renderer - element list to PNG
#[derive(Parser, Debug)]
#[command(name = "signature-render")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Element list (JSON)
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Output PNG path
    #[arg(short, long, value_name = "FILE", default_value = "signature.png")]
    output: PathBuf,

    /// Renderer configuration (JSON); defaults are used when omitted
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Font directory to register (repeatable)
    #[arg(long = "font-dir", value_name = "DIR")]
    font_dirs: Vec<PathBuf>,

    /// Export scale factor
    #[arg(long)]
    scale: Option<f32>,

    /// Public base URL replacing localhost in image URLs
    #[arg(long, value_name = "URL")]
    public_base_url: Option<String>,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RenderError> {
    let mut config = match &cli.config {
        Some(path) => RenderConfig::from_json(&tokio::fs::read_to_string(path).await?)?,
        None => RenderConfig::default(),
    }
    .with_env_overrides();

    for dir in cli.font_dirs {
        config = config.with_font_directory(dir);
    }
    if let Some(scale) = cli.scale {
        config = config.with_export_scale(scale);
    }
    if let Some(url) = cli.public_base_url {
        config = config.with_public_base_url(url);
    }

    let fonts = Arc::new(FontRegistry::initialize(
        &config.font_directories,
        &config.fallback_font_family,
    ));
    log::info!("{} font faces registered", fonts.registered().len());

    let request = RenderRequest::from_json(&tokio::fs::read_to_string(&cli.input).await?)?;
    let elements = request.into_elements();

    let renderer = SignatureRenderer::new(config, fonts)?;
    let png = renderer.render(&elements).await?;
    tokio::fs::write(&cli.output, &png).await?;

    println!("Wrote {} ({} bytes)", cli.output.display(), png.len());
    Ok(())
}
