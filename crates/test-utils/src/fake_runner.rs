use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use tokio::sync::watch;
use jobsched::errors::Result;
use jobsched::exec::{CommandOutput, CommandRunner};

/// Scripted result for one command string.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Exit 0 with this output.
    Succeed(String),
    /// Exit non-zero with this code and output.
    Exit(i32, String),
    /// Fail to launch at all.
    LaunchError(String),
}

/// A fake runner that:
/// - records which commands were started, in order
/// - tracks how many are running at once
/// - optionally holds every run until the gate is opened
/// - returns scripted results (default: success, output = the command)
pub struct FakeRunner {
    script: Mutex<HashMap<String, Scripted>>,
    started: Mutex<Vec<String>>,
    active: AtomicUsize,
    peak: AtomicUsize,
    gate: watch::Sender<bool>,
}

impl FakeRunner {
    /// Runs complete as soon as they start.
    pub fn new() -> Self {
        Self::with_gate(true)
    }

    /// Runs block until [`FakeRunner::open_gate`] is called.
    pub fn gated() -> Self {
        Self::with_gate(false)
    }

    fn with_gate(open: bool) -> Self {
        let (gate, _) = watch::channel(open);
        Self {
            script: Mutex::new(HashMap::new()),
            started: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            gate,
        }
    }

    pub fn script(&self, command: &str, result: Scripted) {
        self.script
            .lock()
            .unwrap()
            .insert(command.to_string(), result);
    }

    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    /// Commands started so far, in start order.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Runs currently in progress.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous runs seen.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for FakeRunner {
    fn run<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>> {
        Box::pin(async move {
            self.started.lock().unwrap().push(command.to_string());
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let mut gate = self.gate.subscribe();
            let _ = gate.wait_for(|open| *open).await;

            self.active.fetch_sub(1, Ordering::SeqCst);

            let scripted = self.script.lock().unwrap().get(command).cloned();
            match scripted {
                None => Ok(CommandOutput {
                    success: true,
                    exit_code: Some(0),
                    output: command.as_bytes().to_vec(),
                }),
                Some(Scripted::Succeed(out)) => Ok(CommandOutput {
                    success: true,
                    exit_code: Some(0),
                    output: out.into_bytes(),
                }),
                Some(Scripted::Exit(code, out)) => Ok(CommandOutput {
                    success: false,
                    exit_code: Some(code),
                    output: out.into_bytes(),
                }),
                Some(Scripted::LaunchError(msg)) => Err(anyhow!(msg).into()),
            }
        })
    }
}
