//! MetaChain key generator CLI
//!
//! Usage:
//!   mc_keygen generate                                  # Fresh identity
//!   mc_keygen generate -s 00000000000000000000000000000000 -p TREZOR
//!   mc_keygen search -f MC112nab --max-attempts 100000  # Vanity address
//!   mc_keygen search -f abc -t pubkey                   # Vanity public key

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mc_keygen::config::{Command, GenerateArgs, SearchArgs};
use mc_keygen::{Config, ConfigError, SearchOutcome, StopReason, VanityResult, WorkerPool};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    let result = match &config.command {
        Command::Generate(args) => generate(args),
        Command::Search(args) => search(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn generate(args: &GenerateArgs) -> Result<(), ConfigError> {
    let pipeline = args.identity.pipeline(args.curve)?;
    let entropy = args.entropy(&mut rand::thread_rng())?;
    let identity = pipeline.derive(entropy)?;
    println!("{identity}");
    Ok(())
}

fn search(args: &SearchArgs) -> Result<(), ConfigError> {
    // Both checked before any entropy is drawn.
    let pipeline = args.pipeline()?;
    let pattern = args.pattern(&pipeline)?;
    let workers = args.worker_count();

    println!("MetaChain Vanity Search");
    println!("=======================");
    println!("Prefix:     {} ({})", pattern.prefix(), pattern.target());
    println!("Difficulty: {}", pattern.difficulty_description());
    println!("Workers:    {}", workers);
    println!();

    let mut pool = WorkerPool::new(workers, pipeline, pattern, args.budget())?;

    ctrlc_handler(pool.stop_flag_clone());
    info!(workers, "searching, press Ctrl+C to stop");

    match pool.run(args.report_interval()) {
        SearchOutcome::Found { result, elapsed } => {
            print_result(&result);
            println!("Time elapsed: {:.2}s", elapsed.as_secs_f64());
        }
        SearchOutcome::Stopped {
            reason, attempts, ..
        } => {
            let why = match reason {
                StopReason::Interrupted => "Stopped by user.",
                StopReason::TimedOut => "Time budget spent.",
                StopReason::AttemptsExhausted => "Attempt budget spent.",
                StopReason::Aborted => "Search aborted, see the log.",
            };
            println!("\n{why} No match after {} attempts.", format_number(attempts));
        }
    }

    // Print final stats
    println!("\n--- Final Statistics ---");
    println!("Total attempts:       {}", format_number(pool.total_attempts()));
    println!("Derivation failures:  {}", pool.derivation_failures());
    println!("Time elapsed:         {:.2}s", pool.elapsed().as_secs_f64());
    println!(
        "Average speed:        {}/s",
        format_number(pool.attempts_per_second() as u64)
    );

    pool.join();
    Ok(())
}

fn print_result(result: &VanityResult) {
    println!("=== Match (worker {}, attempt {}) ===", result.worker_id, result.attempts);
    println!("{}", result.identity);
    println!();
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn ctrlc_handler(stop_flag: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Relaxed);
    }) {
        warn!("could not install Ctrl-C handler: {e}");
    }
}
