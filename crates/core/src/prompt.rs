//! Confirmation prompt trait

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::{Error, Result};

/// A single yes/no confirmation.
///
/// Implementations return `Ok(false)` for an explicit decline and
/// `Err(Error::PromptInterrupted)` when the prompt is interrupted
/// (e.g. Ctrl-C or closed stdin).
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, message: &str) -> Result<bool>;
}

/// Terminal prompt reading a `y`/`yes` answer from stdin
#[derive(Debug, Default)]
pub struct StdinConfirmation;

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn confirm(&self, message: &str) -> Result<bool> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("{} [y/N] ", message).as_bytes())
            .await?;
        stdout.flush().await?;

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            // EOF before an answer counts as an interruption
            return Err(Error::PromptInterrupted);
        }

        let answer = line.trim().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}
