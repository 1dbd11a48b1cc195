use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sealbyte::config::{ARGON_MEMORY, ARGON_THREADS, ARGON_TIME, CHUNK_SIZE, PASSWORD_MIN_LENGTH};
use sealbyte::types::Processing;
use sealbyte::{Algorithm, CancellationToken, Control, Destination, Engine, EngineConfig, KdfParams, Password};
use tracing_subscriber::EnvFilter;

use crate::ui::display::{show_algorithms, show_success};
use crate::ui::progress::Bar;
use crate::ui::prompt::Prompt;

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt a file into a new container.
    Encrypt {
        #[command(flatten)]
        target: Target,

        /// Cipher for the new container.
        #[arg(short, long, env = "SEALBYTE_ALGORITHM", default_value_t = Algorithm::Aes256Gcm, value_parser = parse_algorithm)]
        algorithm: Algorithm,

        #[command(flatten)]
        tuning: Tuning,
    },

    /// Decrypt a container. Algorithm and work factors are read from it.
    Decrypt {
        #[command(flatten)]
        target: Target,
    },

    /// List supported algorithms.
    Algorithms,
}

/// Input, output and password options shared by both directions.
#[derive(Args)]
pub struct Target {
    /// File to process.
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory [default: the input's directory].
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output file name [default: derived from the input].
    #[arg(short, long)]
    name: Option<String>,

    /// Password; prompted for when absent.
    #[arg(short, long, env = "SEALBYTE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Replace an existing output file.
    #[arg(short, long, env = "SEALBYTE_FORCE")]
    force: bool,
}

impl Target {
    fn destination(&self) -> Destination {
        let dir = self.output.clone().unwrap_or_else(|| self.input.parent().filter(|p| !p.as_os_str().is_empty()).map_or_else(|| PathBuf::from("."), Path::to_path_buf));
        let destination = Destination::dir(dir);

        match &self.name {
            Some(name) => destination.with_file_name(name.clone()),
            None => destination,
        }
    }
}

/// Settings for new containers.
#[derive(Args)]
pub struct Tuning {
    /// Argon2id time cost.
    #[arg(long, env = "SEALBYTE_KDF_ITERATIONS", default_value_t = ARGON_TIME)]
    kdf_iterations: u32,

    /// Argon2id memory cost in KiB.
    #[arg(long, env = "SEALBYTE_KDF_MEMORY", default_value_t = ARGON_MEMORY)]
    kdf_memory: u32,

    /// Argon2id lanes.
    #[arg(long, env = "SEALBYTE_KDF_PARALLELISM", default_value_t = ARGON_THREADS)]
    kdf_parallelism: u32,

    /// Plaintext bytes per chunk.
    #[arg(long, env = "SEALBYTE_CHUNK_SIZE", default_value_t = CHUNK_SIZE)]
    chunk_size: usize,
}

#[derive(Parser)]
#[command(name = "sealbyte", version, about = "Encrypt files into self-describing, chunk-authenticated containers.")]
pub struct App {
    #[command(subcommand)]
    command: Commands,
}

impl App {
    pub fn init() -> Result<Self> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let subscriber = tracing_subscriber::fmt().with_file(true).with_line_number(true).with_env_filter(filter).with_writer(std::io::stderr).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        Ok(Self::parse())
    }

    pub async fn execute(self) -> Result<()> {
        let prompt = Prompt::new(PASSWORD_MIN_LENGTH);

        match self.command {
            Commands::Encrypt { target, algorithm, tuning } => {
                let config = EngineConfig {
                    kdf: KdfParams { iterations: tuning.kdf_iterations, memory_kib: tuning.kdf_memory, parallelism: tuning.kdf_parallelism },
                    chunk_size: tuning.chunk_size,
                    overwrite: target.force,
                };
                Self::run(Processing::Encryption, config, &target, Some(algorithm), &prompt).await
            }
            Commands::Decrypt { target } => {
                let config = EngineConfig { overwrite: target.force, ..EngineConfig::default() };
                Self::run(Processing::Decryption, config, &target, None, &prompt).await
            }
            Commands::Algorithms => {
                show_algorithms();
                Ok(())
            }
        }
    }

    async fn run(processing: Processing, config: EngineConfig, target: &Target, algorithm: Option<Algorithm>, prompt: &Prompt) -> Result<()> {
        let engine = Engine::new(config).context("invalid settings")?;
        let destination = target.destination();

        let password = match &target.password {
            Some(password) => Password::new(password),
            None => Self::get_password(prompt, processing)?,
        };

        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        let control = Control::new().with_cancel(cancel).with_progress(Arc::new(Bar::new(processing.label())));

        let result = match (processing, algorithm) {
            (Processing::Encryption, Some(algorithm)) => engine.encrypt_with(&target.input, password, algorithm, &destination, &control).await,
            _ => engine.decrypt_with(&target.input, password, &destination, &control).await,
        };
        watcher.abort();

        let action = match processing {
            Processing::Encryption => "encrypt",
            Processing::Decryption => "decrypt",
        };
        let output = result.with_context(|| format!("failed to {action} {}", target.input.display()))?;
        let size = std::fs::metadata(&output).ok().map(|m| m.len());
        show_success(processing, &output, size);

        Ok(())
    }

    fn get_password(prompt: &Prompt, processing: Processing) -> Result<Password> {
        let password = match processing {
            Processing::Encryption => prompt.encryption_password()?,
            Processing::Decryption => prompt.decryption_password()?,
        };

        Ok(Password::from_string(password))
    }
}

fn parse_algorithm(value: &str) -> Result<Algorithm, String> {
    value.parse().map_err(|_| format!("unknown algorithm {value:?}; run `sealbyte algorithms` to list supported ones"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        App::command().debug_assert();
    }

    #[test]
    fn test_parse_encrypt() {
        let app = App::try_parse_from(["sealbyte", "encrypt", "-i", "notes.txt", "-a", "xchacha20-poly1305", "--chunk-size", "65536"]).unwrap();

        let Commands::Encrypt { target, algorithm, tuning } = app.command else { panic!("expected encrypt") };
        assert_eq!(algorithm, Algorithm::XChaCha20Poly1305);
        assert_eq!(tuning.chunk_size, 65536);
        assert_eq!(target.destination(), Destination::dir("."));
    }

    #[test]
    fn test_parse_decrypt_destination() {
        let app = App::try_parse_from(["sealbyte", "decrypt", "-i", "/data/notes.txt.encrypted", "-o", "/restore", "-n", "notes.txt"]).unwrap();

        let Commands::Decrypt { target } = app.command else { panic!("expected decrypt") };
        assert_eq!(target.destination(), Destination::dir("/restore").with_file_name("notes.txt"));
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        assert!(App::try_parse_from(["sealbyte", "encrypt", "-i", "x", "-a", "rot13"]).is_err());
    }
}
