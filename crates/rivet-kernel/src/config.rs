use crate::error::KernelError;
use std::str::FromStr;

/// Scheduling policy, fixed at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Strict priority with priority donation through locks.
    #[default]
    Priority,
    /// Multi-level feedback queue: priorities derived from nice, recent CPU
    /// use and the system load average.
    Mlfqs,
}

#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub policy: Policy,
    /// Ticks a thread may run before yielding to its equal-priority peers.
    pub time_slice: u32,
    /// Timer interrupts per second; MLFQS recomputes once per second.
    pub timer_freq: u32,
    /// Longest lock-wait chain priority donation will follow.
    pub donation_depth: usize,
    /// Live thread records (idle and the initial thread included).
    pub max_threads: usize,
    /// Stack size of each thread's execution context.
    pub stack_size: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            policy: Policy::Priority,
            time_slice: 4,
            timer_freq: 100,
            donation_depth: 8,
            max_threads: 256,
            stack_size: 256 * 1024,
        }
    }
}

impl KernelConfig {
    pub fn mlfqs() -> Self {
        Self {
            policy: Policy::Mlfqs,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), KernelError> {
        if self.time_slice == 0 {
            return Err(KernelError::Config("time slice must be at least one tick".into()));
        }
        if !(19..=1000).contains(&self.timer_freq) {
            return Err(KernelError::Config(format!(
                "timer frequency {} Hz outside 19..=1000",
                self.timer_freq
            )));
        }
        if self.donation_depth == 0 {
            return Err(KernelError::Config("donation depth must be at least one".into()));
        }
        // The initial thread and idle always exist.
        if self.max_threads < 2 {
            return Err(KernelError::Config(format!(
                "max_threads {} leaves no room for the initial and idle threads",
                self.max_threads
            )));
        }
        Ok(())
    }

    /// Parses kernel command-line options such as `-o mlfqs -o time-slice=8`.
    pub fn from_cmdline(cmdline: &str) -> Result<Self, KernelError> {
        let mut config = Self::default();
        let mut words = cmdline.split_whitespace();
        while let Some(word) = words.next() {
            if word != "-o" {
                return Err(KernelError::Config(format!("unknown option `{word}`")));
            }
            let opt = words
                .next()
                .ok_or_else(|| KernelError::Config("`-o` needs an argument".into()))?;
            config.apply(opt)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, opt: &str) -> Result<(), KernelError> {
        let (key, value) = match opt.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (opt, None),
        };
        match key {
            "mlfqs" => self.policy = Policy::Mlfqs,
            "time-slice" => self.time_slice = number(key, value)?,
            "timer-freq" => self.timer_freq = number(key, value)?,
            "donation-depth" => self.donation_depth = number(key, value)?,
            "max-threads" => self.max_threads = number(key, value)?,
            _ => return Err(KernelError::Config(format!("unknown kernel option `{key}`"))),
        }
        Ok(())
    }
}

fn number<T: FromStr>(key: &str, value: Option<&str>) -> Result<T, KernelError> {
    let v = value.ok_or_else(|| KernelError::Config(format!("`{key}` needs a value")))?;
    v.parse()
        .map_err(|_| KernelError::Config(format!("`{key}`: `{v}` is not a number in range")))
}
