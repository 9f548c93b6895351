//! floodgate – inspect selection expressions and measure monitored-queue
//! throughput.
//
//  $ floodgate tokenize 'exists(a.b) && x >= -42'
//  $ floodgate shell
//  > price > 100 || ~flagged
//  $ floodgate bench --config floodgate.toml
use floodgate::config::{load_config_with_env, Config, CONFIG};
use floodgate::logging::init_logging;
use floodgate::selector::Lexer;
use floodgate::{metrics, MonitoredQueue};

use clap::{Parser, Subcommand};
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};

use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "floodgate", version, about = "Floodgate queue & selector tools")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the tokens of a selection expression.
    Tokenize {
        /// Expression text (quote it in the shell)
        expr: String,
    },
    /// Interactive tokenizer shell.
    Shell,
    /// Run pusher threads against a single popper and report throughput.
    Bench {
        /// Path to config TOML (env FLOODGATE_CONFIG overrides). Without it
        /// the process-wide config is used.
        #[arg(short, long)]
        config: Option<String>,
        /// Overrides `bench.pushers`
        #[arg(long)]
        pushers: Option<usize>,
        /// Overrides `bench.iterations`
        #[arg(long)]
        iterations: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    match cli.cmd {
        Command::Tokenize { expr } => print_tokens(&expr),
        Command::Shell => shell()?,
        Command::Bench {
            config,
            pushers,
            iterations,
        } => {
            let mut cfg: Config = match config {
                Some(path) => load_config_with_env(&path).unwrap_or_else(|e| {
                    tracing::warn!(path = %path, error = %e, "Config not loaded, using defaults");
                    Config::default()
                }),
                None => CONFIG.clone(),
            };
            if let Some(p) = pushers {
                cfg.bench.pushers = p;
            }
            if let Some(i) = iterations {
                cfg.bench.iterations = i;
            }
            bench(&cfg)?;
        }
    }
    Ok(())
}

fn print_tokens(expr: &str) {
    for token in Lexer::new(expr) {
        let marker = if token.kind.is_error() { "  <- error" } else { "" };
        println!("{:>4}:{:<4} {}{}", token.position.line, token.position.column, token.kind, marker);
    }
}

// ───────────────────────────────────────────────────────────
// Interactive shell
// ───────────────────────────────────────────────────────────
fn shell() -> anyhow::Result<()> {
    let mut rl: Editor<(), DefaultHistory> = DefaultEditor::new()?;
    println!("Enter a selection expression. Type `exit` to leave.");

    loop {
        let Ok(line) = rl.readline("> ") else { break };
        let _ = rl.add_history_entry(line.as_str());

        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            expr => print_tokens(expr),
        }
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────
// Throughput driver
// ───────────────────────────────────────────────────────────
struct BenchItem {
    value: u64,
}

fn busy_work(load: u32) -> u32 {
    let mut j = 1u32;
    for _ in 0..load {
        j = j * 3 % 7;
    }
    j
}

fn bench(cfg: &Config) -> anyhow::Result<()> {
    // `None` is the stop sentinel for the popper.
    let queue: Arc<MonitoredQueue<Option<Box<BenchItem>>>> = Arc::new(cfg.build_queue()?);
    let pushers = cfg.bench.pushers.max(1);
    let per_pusher = cfg.bench.iterations / pushers;
    let total = per_pusher * pushers;
    let load = cfg.bench.busy_work;

    let popper = {
        let queue = Arc::clone(&queue);
        thread::Builder::new().name("popper".into()).spawn(move || {
            let mut processed = 0u64;
            while let Ok(Some(item)) = queue.pop_front() {
                black_box(busy_work(load));
                processed += black_box(item).value;
            }
            processed
        })?
    };

    let start = Instant::now();
    let handles = (0..pushers)
        .map(|i| {
            let queue = Arc::clone(&queue);
            thread::Builder::new()
                .name(format!("pusher-{i}"))
                .spawn(move || {
                    for _ in 0..per_pusher {
                        if queue.push_back(Some(Box::new(BenchItem { value: 1 }))).is_err() {
                            break;
                        }
                    }
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("pusher thread panicked"))?;
    }
    queue
        .push_back(None)
        .map_err(|e| anyhow::anyhow!("failed to stop popper: {e}"))?;
    let processed = popper
        .join()
        .map_err(|_| anyhow::anyhow!("popper thread panicked"))?;
    let elapsed = start.elapsed();

    let per_sec = processed as f64 / elapsed.as_secs_f64();
    println!(
        "Processed {processed} items (expected {total}) with {pushers} pushers in {elapsed:?}. {per_sec:.0}/s"
    );
    // the stop sentinel is one extra push and pop
    let (pushed, popped) = (metrics::pushed(), metrics::popped());
    if pushed != popped || popped != total as u64 + 1 {
        tracing::warn!(pushed, popped, total, "Queue counters do not match the run");
    }
    print!("{}", metrics::snapshot());
    Ok(())
}
