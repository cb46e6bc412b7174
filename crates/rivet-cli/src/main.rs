use clap::{Args, Parser, Subcommand};
use log::debug;
use rivet_kernel::{KernelConfig, Policy};
use rivet_runtime::{Runtime, Workload};
use std::error::Error;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot a kernel and run a workload on it
    Run {
        /// Workload name (see `list`)
        workload: Workload,

        #[command(flatten)]
        kernel: KernelArgs,
    },
    /// List the available workloads
    List,
}

#[derive(Args)]
struct KernelArgs {
    /// Use the multi-level feedback queue scheduler
    #[arg(long)]
    mlfqs: bool,

    /// Ticks per time slice
    #[arg(long)]
    time_slice: Option<u32>,

    /// Timer interrupts per second
    #[arg(long)]
    timer_freq: Option<u32>,

    /// Longest lock-wait chain followed by priority donation
    #[arg(long)]
    donation_depth: Option<usize>,

    /// Maximum number of live threads
    #[arg(long)]
    max_threads: Option<usize>,

    /// Kernel command line, e.g. "-o mlfqs -o time-slice=8"; flags above
    /// take precedence
    #[arg(long, default_value = "")]
    cmdline: String,
}

impl KernelArgs {
    fn config(&self) -> Result<KernelConfig, Box<dyn Error>> {
        let mut config = KernelConfig::from_cmdline(&self.cmdline)?;
        if self.mlfqs {
            config.policy = Policy::Mlfqs;
        }
        if let Some(n) = self.time_slice {
            config.time_slice = n;
        }
        if let Some(n) = self.timer_freq {
            config.timer_freq = n;
        }
        if let Some(n) = self.donation_depth {
            config.donation_depth = n;
        }
        if let Some(n) = self.max_threads {
            config.max_threads = n;
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { workload, kernel } => {
            let config = kernel.config()?;
            debug!("kernel config: {config:?}");
            println!("Running {workload} ({:?} scheduler)...", config.policy);

            let runtime = Runtime::new(config)?;
            let report = runtime.run(workload)?;
            println!("{report}");

            println!("Execution completed.");
        }
        Commands::List => {
            for w in Workload::ALL {
                println!("{:<24}{:<10}{}", w.name(), format!("{:?}", w.policy()), w.describe());
            }
        }
    }

    Ok(())
}
