// src/exec/command.rs

//! Shell command construction and combined-output capture.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

/// What a finished command left behind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// `true` only for a zero exit status.
    pub success: bool,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// stdout and stderr interleaved in the order the bytes arrived.
    pub output: Vec<u8>,
}

impl CommandOutput {
    /// Lossy UTF-8 view of the captured output, for logging.
    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Build a shell command appropriate for the platform.
pub fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    }
}

/// Run `command` through the shell to completion.
///
/// A non-zero exit is not an error here; it is reported through
/// [`CommandOutput::success`]. Errors are reserved for failing to launch or
/// wait on the process at all.
pub async fn run_shell(command: &str) -> Result<CommandOutput> {
    let mut cmd = shell_command(command);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning shell for command '{command}'"))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(pump(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(pump(stderr, tx.clone()));
    }
    drop(tx);

    // Both pumps hold a sender; the channel closes once both streams hit EOF.
    let mut output = Vec::new();
    while let Some(chunk) = rx.recv().await {
        output.extend_from_slice(&chunk);
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for command '{command}'"))?;

    debug!(exit_code = ?status.code(), bytes = output.len(), "shell command exited");

    Ok(CommandOutput {
        success: status.success(),
        exit_code: status.code(),
        output,
    })
}

/// Forward everything read from `reader` into `tx` until EOF.
async fn pump<R>(mut reader: R, tx: mpsc::UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "output stream read failed");
                break;
            }
        }
    }
}
