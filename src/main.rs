//! cryptex - Password-based file encryption
//!
//! Usage:
//!   cryptex encrypt <files...>        - Encrypt files into .ctx containers
//!   cryptex decrypt <files...>        - Restore files from containers
//!   cryptex wrap <payload> <carrier>  - Hide a container inside an image
//!   cryptex unwrap <blob>             - Extract a container from an image
//!   cryptex inspect <file>            - Show container structure

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use cryptex::{
    config::Config,
    crypto::LEGACY_KDF_ITERATIONS,
    vault::{self, VaultOptions},
};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zeroize::Zeroizing;

/// Environment variable consulted for the password before prompting
const PASSWORD_ENV: &str = "CRYPTEX_PASSWORD";

#[derive(Parser)]
#[command(name = "cryptex")]
#[command(author = "cryptex Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Password-based file encryption with optional image camouflage")]
struct Cli {
    /// Configuration file path (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt one or more files
    Encrypt {
        /// Files to encrypt
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Hide the result at the end of this image
        #[arg(long)]
        carrier: Option<PathBuf>,

        /// MIME type to record (guessed from the extension otherwise)
        #[arg(long)]
        mime: Option<String>,

        /// Output directory (defaults to next to each input)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Read encryption password from file
        #[arg(long)]
        password_file: Option<PathBuf>,

        /// Overwrite existing output files
        #[arg(long)]
        force: bool,
    },

    /// Decrypt one or more containers
    Decrypt {
        /// Containers (plain or wrapped in an image)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory (defaults to next to each input)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Read encryption password from file
        #[arg(long)]
        password_file: Option<PathBuf>,

        /// Use the iteration count of early releases (100000)
        #[arg(long, conflicts_with = "iterations")]
        legacy: bool,

        /// Override the PBKDF2 iteration count
        #[arg(long)]
        iterations: Option<u32>,

        /// Overwrite existing output files
        #[arg(long)]
        force: bool,
    },

    /// Append an existing container to a carrier image
    Wrap {
        /// Container to hide
        payload: PathBuf,

        /// Carrier image
        carrier: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract a container from a carrier image
    Unwrap {
        /// Wrapped file
        blob: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show the structure of a container without decrypting it
    Inspect {
        /// Container (plain or wrapped)
        file: PathBuf,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn main() {
    let cli = Cli::parse();

    let config_path = expand_tilde(&cli.config.clone().unwrap_or_else(Config::default_path));
    let config = Config::load_or_default(&config_path);

    let level = match (&config, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(config), false) => config.logging.level.clone(),
        (Err(_), false) => "info".to_string(),
    };
    init_logging(&level);

    let result = config
        .map_err(anyhow::Error::from)
        .and_then(|config| run_command(cli.command, &config, &config_path));

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to set tracing subscriber");
    }
}

fn run_command(command: Commands, config: &Config, config_path: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Encrypt {
            files,
            carrier,
            mime,
            out_dir,
            password_file,
            force,
        } => cmd_encrypt(config, &files, carrier, mime, out_dir, password_file, force),

        Commands::Decrypt {
            files,
            out_dir,
            password_file,
            legacy,
            iterations,
            force,
        } => {
            let iterations = if legacy { Some(LEGACY_KDF_ITERATIONS) } else { iterations };
            cmd_decrypt(config, &files, out_dir, password_file, iterations, force)
        }

        Commands::Wrap {
            payload,
            carrier,
            output,
        } => cmd_wrap(&payload, &carrier, &output),

        Commands::Unwrap { blob, output } => cmd_unwrap(&blob, &output),

        Commands::Inspect { file } => cmd_inspect(&file),

        Commands::Config(ConfigCommands::Init { force }) => cmd_config_init(config_path, force),

        Commands::Config(ConfigCommands::Show) => cmd_config_show(config, config_path),
    }
}

fn cmd_encrypt(
    config: &Config,
    files: &[PathBuf],
    carrier: Option<PathBuf>,
    mime: Option<String>,
    out_dir: Option<PathBuf>,
    password_file: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<()> {
    let options = config.vault_options();
    let out_dir = out_dir.or_else(|| config.output.output_dir.clone());

    let carrier_path = carrier.or_else(|| config.output.carrier_image.clone());
    let carrier = match &carrier_path {
        Some(path) => Some(
            std::fs::read(path)
                .with_context(|| format!("Failed to read carrier image {:?}", path))?,
        ),
        None => None,
    };
    let extension = match &carrier_path {
        Some(path) => path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png")
            .to_string(),
        None => config.output.extension.clone(),
    };

    let password = read_password(password_file.as_deref(), true)?;

    run_batch("encrypt", files, |input| {
        let content =
            std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
        let name = input
            .file_name()
            .and_then(|n| n.to_str())
            .context("Input path has no UTF-8 file name")?
            .to_string();
        let mime_type = mime.clone().unwrap_or_else(|| guess_mime(input).to_string());

        let output = output_path(input, out_dir.as_deref(), &format!("{}.{}", name, extension));
        refuse_overwrite(&output, force)?;

        info!("Encrypting {:?} ({}, {} bytes)", input, mime_type, content.len());
        let blob = vault::encrypt_file(
            &content,
            &name,
            &mime_type,
            &password,
            &options,
            carrier.as_deref(),
            &mut log_progress,
        )?;

        std::fs::write(&output, &blob).with_context(|| format!("Failed to write {:?}", output))?;
        Ok(output)
    })
}

fn cmd_decrypt(
    config: &Config,
    files: &[PathBuf],
    out_dir: Option<PathBuf>,
    password_file: Option<PathBuf>,
    iterations: Option<u32>,
    force: bool,
) -> anyhow::Result<()> {
    let mut options: VaultOptions = config.vault_options();
    if let Some(iterations) = iterations {
        if iterations == 0 {
            bail!("Iteration count must be greater than 0");
        }
        options.kdf_iterations = iterations;
    }
    let out_dir = out_dir.or_else(|| config.output.output_dir.clone());
    let extension = config.output.extension.clone();

    let password = read_password(password_file.as_deref(), false)?;

    run_batch("decrypt", files, |input| {
        let blob = std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;

        info!("Decrypting {:?}", input);
        let file = vault::decrypt_file(&blob, &password, &options, &mut log_progress)?;

        let name = restored_name(&file.name, input, &extension);
        let output = output_path(input, out_dir.as_deref(), &name);
        refuse_overwrite(&output, force)?;

        debug!("Restored {} ({}, {} bytes)", name, file.mime_type, file.content.len());
        std::fs::write(&output, &file.content)
            .with_context(|| format!("Failed to write {:?}", output))?;
        Ok(output)
    })
}

fn cmd_wrap(payload: &Path, carrier: &Path, output: &Path) -> anyhow::Result<()> {
    let payload_bytes =
        std::fs::read(payload).with_context(|| format!("Failed to read {:?}", payload))?;
    let carrier_bytes =
        std::fs::read(carrier).with_context(|| format!("Failed to read {:?}", carrier))?;

    let wrapped = vault::wrap_in_image(&payload_bytes, &carrier_bytes)?;
    std::fs::write(output, wrapped).with_context(|| format!("Failed to write {:?}", output))?;

    info!("Wrapped {:?} into {:?}", payload, output);
    Ok(())
}

fn cmd_unwrap(blob: &Path, output: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(blob).with_context(|| format!("Failed to read {:?}", blob))?;

    if !cryptex::stego::is_wrapped(&bytes) {
        warn!("{:?} carries no wrapping marker, copying it unchanged", blob);
    }
    let payload = vault::unwrap_from_image(&bytes)?;
    std::fs::write(output, payload).with_context(|| format!("Failed to write {:?}", output))?;

    info!("Extracted {} bytes into {:?}", payload.len(), output);
    Ok(())
}

fn cmd_inspect(file: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let info = vault::inspect(&bytes)?;

    println!("cryptex Container");
    println!("=================");
    println!();
    println!("File: {:?}", file);
    println!("Wrapped in carrier: {}", if info.wrapped { "yes" } else { "no" });
    if info.wrapped {
        println!("Carrier size: {} bytes", info.carrier_len);
    }
    println!("Salt: {}", hex::encode(info.material.salt));
    println!("Base nonce: {}", hex::encode(info.material.base_nonce));
    println!("Metadata block: {} bytes", info.metadata_len);
    println!("Data chunks: {}", info.chunk_count);
    println!("Body size: {} bytes", info.body_len);

    Ok(())
}

fn cmd_config_init(config_path: &Path, force: bool) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        bail!("{:?} already exists (use --force to overwrite)", config_path);
    }

    Config::default().save(config_path)?;
    info!("Wrote default configuration to {:?}", config_path);
    Ok(())
}

fn cmd_config_show(config: &Config, config_path: &Path) -> anyhow::Result<()> {
    println!("# {:?}", config_path);
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Process files one at a time. A failing file is reported and skipped;
/// the batch fails overall if any file did.
fn run_batch<F>(action: &str, files: &[PathBuf], mut process: F) -> anyhow::Result<()>
where
    F: FnMut(&Path) -> anyhow::Result<PathBuf>,
{
    let mut failed = 0usize;

    for input in files {
        match process(input) {
            Ok(output) => info!("Wrote {:?}", output),
            Err(e) => {
                warn!("Failed to {} {:?}: {:#}", action, input, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} file(s) failed to {}", failed, files.len(), action);
    }
    Ok(())
}

fn log_progress(percent: u8) {
    debug!("{}%", percent);
}

fn read_password(password_file: Option<&Path>, confirm: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(path) = password_file {
        let content = Zeroizing::new(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read password file {:?}", path))?,
        );
        return non_empty(Zeroizing::new(
            content.trim_end_matches(['\r', '\n']).to_string(),
        ));
    }

    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return non_empty(Zeroizing::new(password));
    }

    let password = Zeroizing::new(
        rpassword::prompt_password("Enter encryption password: ")
            .context("Failed to read password")?,
    );
    if confirm {
        let again = Zeroizing::new(
            rpassword::prompt_password("Confirm encryption password: ")
                .context("Failed to read password")?,
        );
        if *again != *password {
            bail!("Passwords do not match");
        }
    }
    non_empty(password)
}

fn non_empty(password: Zeroizing<String>) -> anyhow::Result<Zeroizing<String>> {
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

fn output_path(input: &Path, out_dir: Option<&Path>, name: &str) -> PathBuf {
    match out_dir {
        Some(dir) => dir.join(name),
        None => input
            .parent()
            .map(|p| p.join(name))
            .unwrap_or_else(|| PathBuf::from(name)),
    }
}

fn refuse_overwrite(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        bail!("{:?} already exists (use --force to overwrite)", output);
    }
    Ok(())
}

/// File name to restore a decrypted file under
///
/// The stored name wins, reduced to its last path component so a crafted
/// container cannot write outside the output directory. Falls back to the
/// container's own name without its extension.
fn restored_name(stored: &str, input: &Path, extension: &str) -> String {
    let stored = Path::new(stored)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "." && *n != "..");
    if let Some(name) = stored {
        return name.to_string();
    }

    let fallback = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let suffix = format!(".{}", extension);
    match fallback.strip_suffix(&suffix) {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => "decrypted".to_string(),
    }
}

/// MIME type for a path, from its extension
fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "log" | "md" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "rar" => "application/vnd.rar",
        "7z" => "application/x-7z-compressed",
        "apk" => "application/vnd.android.package-archive",
        _ => "application/octet-stream",
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
