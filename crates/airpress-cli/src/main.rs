//! Command-line interface for building signed Apple Wallet passes.
//!
//! Collects assets from a directory and/or individual `--asset` arguments,
//! signs the manifest with a pass type ID certificate and writes the
//! `.pkpass` archive.

use airpress::{CompressionLevel, Credentials, PassPackage};
use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use walkdir::{DirEntry, WalkDir};

#[derive(Parser)]
#[command(name = "airpress")]
#[command(about = "Build and sign Apple Wallet passes (.pkpass)")]
struct Cli {
    /// Directory holding pass.json and images
    assets: Option<PathBuf>,

    /// Extra asset as NAME=PATH (repeatable)
    #[arg(long = "asset", value_name = "NAME=PATH", value_parser = parse_asset_arg)]
    extra_assets: Vec<(String, PathBuf)>,

    /// Pass type ID certificate (PEM or DER)
    #[arg(short = 'c', long)]
    certificate: PathBuf,

    /// Private key for the certificate (PEM or DER)
    #[arg(short = 'k', long)]
    private_key: PathBuf,

    /// Apple WWDR intermediate certificate (PEM or DER)
    ///
    /// Required unless the build embeds a default intermediate.
    #[arg(short = 'w', long)]
    wwdr: Option<PathBuf>,

    /// Password for an encrypted private key
    #[arg(long, env = "AIRPRESS_KEY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Output file (default: <asset dir>.pkpass)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Accept assets that are not standard pass images
    #[arg(long)]
    no_validate: bool,

    /// ZIP compression level (1-9)
    #[arg(short = 'z', long, default_value = "6")]
    zip_level: u32,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "airpress=info".into()),
        1 => tracing_subscriber::EnvFilter::new("airpress=debug"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let output = output_path(&cli)?;
    let validate = !cli.no_validate;

    let mut assets = match &cli.assets {
        Some(dir) => collect_assets(dir)?,
        None => Vec::new(),
    };
    for (name, path) in &cli.extra_assets {
        let content =
            fs::read(path).with_context(|| format!("Failed to read asset {}", path.display()))?;
        assets.push((name.clone(), content));
    }
    if assets.is_empty() {
        bail!("No assets given; pass an asset directory or --asset NAME=PATH");
    }

    let credentials = load_credentials(&cli)?;

    let mut pass = PassPackage::with_assets(assets, validate)
        .context("Invalid pass assets (use --no-validate for non-standard files)")?
        .with_credentials(credentials)
        .with_compression_level(CompressionLevel::new(cli.zip_level));

    pass.sign().context("Failed to sign pass manifest")?;

    let archive = pass.to_archive().context("Failed to build pass archive")?;
    fs::write(&output, &archive)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(path = %output.display(), bytes = archive.len(), "pass written");
    println!("Signed: {}", output.display());
    Ok(())
}

fn output_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(output) = &cli.output {
        return Ok(output.clone());
    }

    let dir = match &cli.assets {
        Some(dir) => dir,
        None => bail!("--output is required when no asset directory is given"),
    };

    let mut name = dir
        .canonicalize()
        .ok()
        .and_then(|dir| dir.file_name().map(|name| name.to_os_string()))
        .unwrap_or_else(|| "pass".into());
    name.push(".pkpass");
    Ok(PathBuf::from(name))
}

fn load_credentials(cli: &Cli) -> Result<Credentials> {
    let certificate = fs::read(&cli.certificate)
        .with_context(|| format!("Failed to read certificate {}", cli.certificate.display()))?;
    let private_key = fs::read(&cli.private_key)
        .with_context(|| format!("Failed to read private key {}", cli.private_key.display()))?;

    let mut credentials = Credentials::new()
        .certificate(certificate)
        .private_key(private_key);

    if let Some(wwdr) = &cli.wwdr {
        let intermediate = fs::read(wwdr)
            .with_context(|| format!("Failed to read WWDR certificate {}", wwdr.display()))?;
        credentials = credentials.intermediate(intermediate);
    }

    if let Some(password) = &cli.password {
        credentials = credentials.password(password.as_bytes());
    }

    Ok(credentials)
}

/// Parse `NAME=PATH`.
fn parse_asset_arg(arg: &str) -> std::result::Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got {arg:?}")),
    }
}

/// Read every regular file under `root`, named by its `/`-separated path
/// relative to `root`. Hidden files and directories are skipped.
fn collect_assets(root: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let mut assets = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = asset_name(root, entry.path())?;
        let content = fs::read(entry.path())
            .with_context(|| format!("Failed to read asset {}", entry.path().display()))?;

        debug!(asset = %name, size = content.len(), "collected asset");
        assets.push((name, content));
    }

    Ok(assets)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn asset_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;

    let parts = relative
        .components()
        .map(|component| {
            component
                .as_os_str()
                .to_str()
                .with_context(|| format!("Asset path {} is not valid UTF-8", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(parts.join("/"))
}
