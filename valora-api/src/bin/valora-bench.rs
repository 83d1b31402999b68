use clap::{Parser, ValueEnum};
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use valora_api::report::{format_checkpoint, format_decimal_br, format_integer_br, render_run};
use valora_catalog::PricingEngine;
use valora_order::{run_parallel, RunOutcome, RunResult, SerialRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Serial,
    Parallel,
    Both,
}

/// Value synthetic orders and report throughput and totals
#[derive(Debug, Parser)]
#[command(name = "valora-bench", version)]
struct Args {
    /// Number of orders to value
    #[arg(long, default_value_t = 100_000_000)]
    records: u64,

    #[arg(long, value_enum, default_value_t = Mode::Both)]
    mode: Mode,

    /// Parallel worker threads [default: one per hardware thread]
    #[arg(long)]
    workers: Option<usize>,

    /// Serial progress interval in records, 0 to disable
    #[arg(long, default_value_t = 100_000_000)]
    checkpoint: u64,

    /// -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("valora_order={level},valora_bench={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn timed<F>(run: F) -> RunOutcome<(RunResult, f64)>
where
    F: FnOnce() -> RunOutcome<RunResult>,
{
    let started = Instant::now();
    let result = run()?;
    Ok((result, started.elapsed().as_secs_f64()))
}

fn bench(args: &Args) -> RunOutcome<()> {
    let engine = PricingEngine::default();
    let rule = "─".repeat(60);

    println!("BENCHMARK: VALORAÇÃO DE PEDIDOS");
    println!("{}", rule);
    println!("Processando {} pedidos...", format_integer_br(args.records));

    let serial = if matches!(args.mode, Mode::Serial | Mode::Both) {
        let (result, total) = timed(|| {
            SerialRunner::new(&engine)
                .with_checkpoint_interval(args.checkpoint)
                .run_observed(args.records, |checkpoint| {
                    println!("  {}", format_checkpoint(&checkpoint));
                })
        })?;
        println!();
        println!("{}", render_run("Serial", &result, total));
        println!("{}", rule);
        Some(result)
    } else {
        None
    };

    let parallel = if matches!(args.mode, Mode::Parallel | Mode::Both) {
        let (result, total) = timed(|| run_parallel(args.records, args.workers))?;
        println!("{}", render_run("Paralelo", &result, total));
        println!("{}", rule);
        Some(result)
    } else {
        None
    };

    if let (Some(serial), Some(parallel)) = (serial, parallel) {
        let speedup = serial.execution_time() / parallel.execution_time().max(f64::MIN_POSITIVE);
        println!("VEREDITO FINAL:");
        println!(
            "O modo paralelo foi {}x mais rápido usando {} núcleos.",
            format_decimal_br(speedup, 1),
            parallel.cores_used.unwrap_or(1)
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match bench(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERRO: {}", e);
            ExitCode::FAILURE
        }
    }
}
