#![allow(dead_code)]

use rivet_kernel::{Kernel, KernelConfig};
use std::sync::{Arc, Mutex};

pub fn boot(config: KernelConfig) -> Kernel {
    let _ = env_logger::builder().is_test(true).try_init();
    Kernel::boot(config).unwrap()
}

/// Lines written by kernel threads, in the order they ran.
#[derive(Clone, Default)]
pub struct Transcript(Arc<Mutex<Vec<String>>>);

impl Transcript {
    pub fn push(&self, line: impl Into<String>) {
        self.0.lock().unwrap().push(line.into());
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
