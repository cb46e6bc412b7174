//! Boots Rivet kernels and drives named workloads on them.

pub mod workloads;

pub use workloads::Workload;

use log::{debug, info};
use rivet_kernel::{Kernel, KernelConfig, KernelError, Policy, Stats};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("kernel halted: {0}")]
    Halted(String),

    #[error("unknown workload `{0}`")]
    UnknownWorkload(String),

    #[error("workload `{workload}` needs the {policy:?} scheduler")]
    WrongPolicy {
        workload: &'static str,
        policy: Policy,
    },

    #[error("{workload}: {message}")]
    Check {
        workload: &'static str,
        message: String,
    },

    #[error("failed to start the boot thread: {0}")]
    Io(#[from] std::io::Error),
}

/// Lines a workload reports, in the order its threads reported them.
#[derive(Debug, Clone, Default)]
pub struct Transcript(Arc<Mutex<Vec<String>>>);

impl Transcript {
    pub fn push(&self, line: impl Into<String>) {
        let line = line.into();
        debug!("transcript: {line}");
        self.0.lock().unwrap_or_else(|e| e.into_inner()).push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Outcome of one workload run.
#[derive(Debug)]
pub struct Report {
    pub workload: Workload,
    pub transcript: Vec<String>,
    pub stats: Stats,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.transcript {
            writeln!(f, "({}) {line}", self.workload)?;
        }
        write!(f, "{}", self.stats)
    }
}

pub struct Runtime {
    config: KernelConfig,
}

impl Runtime {
    pub fn new(config: KernelConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Runs `workload` on a freshly booted kernel.
    pub fn run(&self, workload: Workload) -> Result<Report, RuntimeError> {
        if workload.policy() != self.config.policy {
            return Err(RuntimeError::WrongPolicy {
                workload: workload.name(),
                policy: workload.policy(),
            });
        }
        info!("running workload {workload}");
        let (transcript, stats) = self.execute(move |kernel, transcript| workload.run(kernel, transcript))?;
        Ok(Report {
            workload,
            transcript,
            stats,
        })
    }

    /// Boots a kernel on a new host thread, which becomes the kernel's
    /// initial thread, and runs `body` there. The kernel is shut down when
    /// `body` returns, whether or not it succeeded.
    ///
    /// A kernel halt surfaces as [`RuntimeError::Halted`].
    pub fn execute<F>(&self, body: F) -> Result<(Vec<String>, Stats), RuntimeError>
    where
        F: FnOnce(&Kernel, &Transcript) -> Result<(), RuntimeError> + Send + 'static,
    {
        let config = self.config.clone();
        let handle = thread::Builder::new()
            .name("rivet boot".into())
            .stack_size(config.stack_size)
            .spawn(move || -> Result<(Vec<String>, Stats), RuntimeError> {
                let kernel = Kernel::boot(config)?;
                let transcript = Transcript::default();
                let outcome = body(&kernel, &transcript);
                let stats = kernel.shutdown();
                outcome?;
                Ok((transcript.lines(), stats))
            })?;
        match handle.join() {
            Ok(result) => result,
            Err(payload) => Err(RuntimeError::Halted(halt_reason(payload))),
        }
    }
}

/// Text of a halt that unwound the initial thread.
fn halt_reason(payload: Box<dyn Any + Send>) -> String {
    let text = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        return "unknown panic".into();
    };
    match text.strip_prefix("kernel halted: ") {
        Some(reason) => reason.to_string(),
        None => text,
    }
}
