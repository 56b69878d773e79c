// Ticket providers
// Yield the platform identity ticket that is exchanged for an access token

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::types::Credentials;

/// Source of platform identity tickets
///
/// Each call must return a fresh ticket; tickets are single-use per exchange.
#[async_trait]
pub trait TicketProvider: Send + Sync {
    async fn ticket(&self, credentials: &Credentials) -> Result<Vec<u8>>;
}

/// Returns the same pre-issued ticket on every call
#[derive(Debug, Clone)]
pub struct StaticTicketProvider {
    ticket: Vec<u8>,
}

impl StaticTicketProvider {
    pub fn new(ticket: Vec<u8>) -> Self {
        Self { ticket }
    }

    /// Build from a hex-encoded ticket
    pub fn from_hex(ticket_hex: &str) -> Result<Self> {
        let ticket = hex::decode(ticket_hex.trim()).context("Ticket is not valid hex")?;
        Ok(Self::new(ticket))
    }
}

#[async_trait]
impl TicketProvider for StaticTicketProvider {
    async fn ticket(&self, _credentials: &Credentials) -> Result<Vec<u8>> {
        if self.ticket.is_empty() {
            anyhow::bail!("Static ticket is empty");
        }
        Ok(self.ticket.clone())
    }
}

/// Runs a helper program that prints a hex-encoded ticket on stdout
///
/// Credentials are passed through `HYDRA_TICKET_USERNAME` and
/// `HYDRA_TICKET_PASSWORD` so they never show up in the process list.
#[derive(Debug, Clone)]
pub struct CommandTicketProvider {
    program: String,
    args: Vec<String>,
}

impl CommandTicketProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().context("Ticket command is empty")?;
        Ok(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl TicketProvider for CommandTicketProvider {
    async fn ticket(&self, credentials: &Credentials) -> Result<Vec<u8>> {
        tracing::debug!(program = %self.program, "Requesting ticket from helper");

        let output = Command::new(&self.program)
            .args(&self.args)
            .env("HYDRA_TICKET_USERNAME", &credentials.username)
            .env("HYDRA_TICKET_PASSWORD", &credentials.password)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run ticket helper: {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Ticket helper exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8(output.stdout).context("Ticket helper output is not UTF-8")?;
        let ticket = hex::decode(stdout.trim()).context("Ticket helper output is not valid hex")?;
        if ticket.is_empty() {
            anyhow::bail!("Ticket helper returned an empty ticket");
        }

        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_from_hex() {
        let provider = StaticTicketProvider::from_hex(" deadbeef \n").unwrap();
        let ticket = provider.ticket(&Credentials::default()).await.unwrap();
        assert_eq!(ticket, vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_static_provider_rejects_bad_hex() {
        assert!(StaticTicketProvider::from_hex("xyz").is_err());
    }

    #[tokio::test]
    async fn test_static_provider_rejects_empty_ticket() {
        let provider = StaticTicketProvider::new(Vec::new());
        assert!(provider.ticket(&Credentials::default()).await.is_err());
    }

    #[test]
    fn test_command_line_parsing() {
        let provider = CommandTicketProvider::from_command_line("ticket-helper --app 1234").unwrap();
        assert_eq!(provider.program, "ticket-helper");
        assert_eq!(provider.args, vec!["--app".to_string(), "1234".to_string()]);

        assert!(CommandTicketProvider::from_command_line("   ").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_provider_reads_stdout() {
        let provider = CommandTicketProvider::new(
            "sh",
            vec!["-c".to_string(), "echo \"$HYDRA_TICKET_USERNAME\" >/dev/null; echo cafe01".to_string()],
        );
        let ticket = provider
            .ticket(&Credentials::new("player", "secret"))
            .await
            .unwrap();
        assert_eq!(ticket, vec![0xca, 0xfe, 0x01]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_provider_propagates_failure() {
        let provider = CommandTicketProvider::new(
            "sh",
            vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()],
        );
        let err = provider
            .ticket(&Credentials::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
