//! Storage operations exposed as subcommands.

mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use bytes::Bytes;
use clap::Subcommand;
use stowage::{FileOptions, Storage};
use tokio::io::AsyncReadExt;

pub use self::output::Output;
use crate::TRACING_TARGET_COMMAND;

/// Operation to run against a disk.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Writes a file, reading stdin when no `--file` is given.
    Put {
        /// Destination path on the disk.
        path: String,
        /// Local file to upload.
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// MIME type to store, inferred from the extension when unset.
        #[arg(long)]
        mime_type: Option<String>,
    },
    /// Prints a file, or writes it to `--output`.
    Get {
        /// Path on the disk.
        path: String,
        /// Local file to write the content to.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Prints whether a file exists.
    Exists {
        /// Path on the disk.
        path: String,
    },
    /// Prints whether a file is missing.
    Missing {
        /// Path on the disk.
        path: String,
    },
    /// Prints the metadata of a file as JSON, `{}` when it is missing.
    Meta {
        /// Path on the disk.
        path: String,
    },
    /// Prints the URL of a file.
    Url {
        /// Path on the disk.
        path: String,
    },
    /// Prints a signed URL of a file.
    SignedUrl {
        /// Path on the disk.
        path: String,
        /// Lifetime of the URL in seconds.
        #[arg(long, default_value_t = 3600)]
        expires_in: u64,
    },
    /// Deletes a file, printing whether it succeeded.
    Delete {
        /// Path on the disk.
        path: String,
    },
    /// Copies a file within the disk.
    Copy {
        /// Source path.
        path: String,
        /// Destination path.
        new_path: String,
    },
    /// Moves a file within the disk.
    Move {
        /// Source path.
        path: String,
        /// Destination path.
        new_path: String,
    },
    /// Lists the configured disks.
    Disks,
}

impl Command {
    /// Returns the subcommand name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Put { .. } => "put",
            Self::Get { .. } => "get",
            Self::Exists { .. } => "exists",
            Self::Missing { .. } => "missing",
            Self::Meta { .. } => "meta",
            Self::Url { .. } => "url",
            Self::SignedUrl { .. } => "signed-url",
            Self::Delete { .. } => "delete",
            Self::Copy { .. } => "copy",
            Self::Move { .. } => "move",
            Self::Disks => "disks",
        }
    }
}

/// Runs a command against the named disk, or the default one.
pub async fn execute(
    storage: &Storage,
    disk: Option<&str>,
    command: Command,
) -> anyhow::Result<Output> {
    if let Command::Disks = command {
        return Ok(list_disks(storage));
    }

    let disk = storage.disk_or_default(disk)?;

    tracing::debug!(
        target: TRACING_TARGET_COMMAND,
        command = command.name(),
        disk = %disk.disk(),
        "Running command"
    );

    let output = match command {
        Command::Put {
            path,
            file,
            mime_type,
        } => {
            let content = read_input(file.as_deref()).await?;
            let options = FileOptions { mime_type };
            Output::json(&disk.put(&path, content, options).await?)?
        }
        Command::Get { path, output } => {
            let Some(content) = disk.get(&path).await else {
                bail!("`{path}` was not found on disk `{}`", disk.disk());
            };

            match output {
                Some(output) => {
                    tokio::fs::write(&output, &content)
                        .await
                        .with_context(|| format!("failed to write {}", output.display()))?;
                    Output::Empty
                }
                None => Output::Bytes(content),
            }
        }
        Command::Exists { path } => Output::Bool(disk.exists(&path).await),
        Command::Missing { path } => Output::Bool(disk.missing(&path).await),
        Command::Meta { path } => Output::json(&disk.meta(&path).await)?,
        Command::Url { path } => Output::Text(disk.url(&path).await?),
        Command::SignedUrl { path, expires_in } => {
            let url = disk
                .signed_url(&path, Duration::from_secs(expires_in))
                .await?;
            Output::Text(url)
        }
        Command::Delete { path } => Output::Bool(disk.delete(&path).await),
        Command::Copy { path, new_path } => Output::json(&disk.copy(&path, &new_path).await?)?,
        Command::Move { path, new_path } => {
            let response = disk.move_file(&path, &new_path).await?;
            if response.source_retained {
                tracing::warn!(
                    target: TRACING_TARGET_COMMAND,
                    path = %path,
                    new_path = %new_path,
                    "Source could not be deleted and still exists"
                );
            }
            Output::json(&response)?
        }
        Command::Disks => list_disks(storage),
    };

    Ok(output)
}

/// Reads upload content from a file, or stdin when none is given.
async fn read_input(file: Option<&std::path::Path>) -> anyhow::Result<Bytes> {
    let content = match file {
        Some(file) => tokio::fs::read(file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?,
        None => {
            let mut content = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut content)
                .await
                .context("failed to read stdin")?;
            content
        }
    };

    Ok(Bytes::from(content))
}

fn list_disks(storage: &Storage) -> Output {
    let disks = storage
        .disk_names()
        .filter_map(|name| storage.disk(name).ok())
        .map(|disk| {
            serde_json::json!({
                "name": disk.disk(),
                "driver": disk.kind().to_string(),
                "default": disk.disk() == storage.default_disk_name(),
            })
        })
        .collect();

    Output::Json(serde_json::Value::Array(disks))
}
