//! Printing command results.

use bytes::Bytes;
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Result of a command, printed to stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Raw file content, printed as-is.
    Bytes(Bytes),
    /// A single line of text.
    Text(String),
    /// `true` or `false`.
    Bool(bool),
    /// Pretty-printed JSON.
    Json(Value),
    /// Nothing to print.
    Empty,
}

impl Output {
    /// Serializes a response as JSON output.
    pub fn json(value: &impl serde::Serialize) -> anyhow::Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    /// Writes the output to stdout.
    pub async fn print(&self) -> anyhow::Result<()> {
        self.write_to(&mut tokio::io::stdout()).await
    }

    /// Writes the output, ending text with a newline.
    pub async fn write_to<W>(&self, writer: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match self {
            Self::Bytes(content) => writer.write_all(content).await?,
            Self::Text(text) => writer.write_all(format!("{text}\n").as_bytes()).await?,
            Self::Bool(value) => writer.write_all(format!("{value}\n").as_bytes()).await?,
            Self::Json(value) => {
                let mut json = serde_json::to_vec_pretty(value)?;
                json.push(b'\n');
                writer.write_all(&json).await?;
            }
            Self::Empty => {}
        }

        writer.flush().await?;
        Ok(())
    }
}
