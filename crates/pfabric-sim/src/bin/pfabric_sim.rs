//! # pfabric-sim
//!
//! Runs the bottleneck simulation with the pFabric scheduler, a drop-tail
//! FIFO, or both, and prints normalised flow completion times.
//!
//! ## Usage
//!
//! ```bash
//! # pFabric vs drop-tail, 3 hosts x 8 flows, sizes scaled down 100x
//! pfabric-sim --qdisc both --hosts 3 --flows 8 --size-divisor 100
//!
//! # Scheduler options in tc syntax, full stats report afterwards
//! pfabric-sim --tc "limit 20" --report text
//!
//! # Scheduler config from TOML, JSON report on stdout
//! pfabric-sim --config pfabric.toml --json
//! ```

use pfabric_core::report::{render_csv, render_prometheus, render_text};
use pfabric_core::{ConfigUpdate, SchedulerConfig, SchedulerCore};
use pfabric_sim::fifo::DropTailFifo;
use pfabric_sim::ideal::LinkModel;
use pfabric_sim::priority::PriorityPolicy;
use pfabric_sim::{SimConfig, SimReport, Simulation};

/// Buffer limit of the drop-tail baseline.
const FIFO_LIMIT_DEFAULT: u32 = 150;

/// Buffer limit of the pFabric queue. pFabric needs far less buffering.
const PFABRIC_LIMIT_DEFAULT: u32 = 15;

fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .compact()
        .init();

    // ── Parse CLI ───────────────────────────────────────────────
    let args = parse_args()?;
    let sched_config = scheduler_config(&args)?;

    tracing::info!(
        qdisc = ?args.qdisc,
        hosts = args.sim.workload.hosts,
        flows_per_host = args.sim.workload.flows_per_host,
        seed = args.sim.workload.seed,
        scheduler = %sched_config,
        fifo_limit = args.fifo_limit,
        "pfabric-sim starting"
    );

    // ── Runs ────────────────────────────────────────────────────
    let mut reports = Vec::new();

    if matches!(args.qdisc, QdiscChoice::Pfabric | QdiscChoice::Both) {
        let sch = SchedulerCore::new(sched_config.clone())?;
        let sim_cfg = SimConfig {
            bands: sched_config.bands,
            ..args.sim.clone()
        };
        let started = quanta::Instant::now();
        let mut sim = Simulation::new(sim_cfg, sch);
        sim.run();
        let (mut report, sch) = sim.finish();
        tracing::info!(elapsed = ?started.elapsed(), "pfabric run done");

        match args.report.as_deref() {
            Some("text") => eprint!("{}", render_text(sch.stats())),
            Some("csv") => eprint!("{}", render_csv(sch.stats())),
            Some("prometheus") => eprint!("{}", render_prometheus(sch.stats())),
            _ => {}
        }
        report.scheduler = Some(sch.stats().clone());
        reports.push(report);
    }

    if matches!(args.qdisc, QdiscChoice::Fifo | QdiscChoice::Both) {
        let sim_cfg = SimConfig {
            // Plain TCP: the switch sees no priorities.
            policy: PriorityPolicy::Constant(0),
            ..args.sim.clone()
        };
        let started = quanta::Instant::now();
        let mut sim = Simulation::new(sim_cfg, DropTailFifo::new(args.fifo_limit));
        sim.run();
        let (report, _) = sim.finish();
        tracing::info!(elapsed = ?started.elapsed(), "fifo run done");
        reports.push(report);
    }

    // ── Output ──────────────────────────────────────────────────
    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_summary(report);
        }
    }

    Ok(())
}

fn scheduler_config(args: &Args) -> anyhow::Result<SchedulerConfig> {
    let mut config = match &args.config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("cannot read config '{}': {}", path, e))?;
            SchedulerConfig::from_toml_str(&text)?
        }
        None => SchedulerConfig {
            limit: PFABRIC_LIMIT_DEFAULT,
            ..SchedulerConfig::default()
        },
    };
    if let Some(limit) = args.limit {
        config.apply(&ConfigUpdate::limit(limit));
    }
    if let Some(tc) = &args.tc {
        let words: Vec<&str> = tc.split_whitespace().collect();
        config.apply(&ConfigUpdate::parse_args(words.as_slice())?);
    }
    config.validate()?;
    Ok(config)
}

fn print_summary(report: &SimReport) {
    println!("== {} ({:?}) ==", report.qdisc, report.policy);
    println!(
        "ticks: {}  quantum: {:.1} us  completed: {}/{}",
        report.ticks,
        report.quantum_secs * 1e6,
        report.completed,
        report.flows.len()
    );
    println!(
        "offered: {}  accepted: {}  congested: {}  dropped: {}",
        report.offers.offered,
        report.offers.accepted,
        report.offers.congested,
        report.offers.dropped
    );
    match report.mean_normalized_fct {
        Some(m) => println!(
            "mean normalized FCT: {:.3}  (ideal SRPT: {:.3})",
            m, report.ideal_mean_normalized_fct
        ),
        None => println!("mean normalized FCT: n/a"),
    }
    for (bucket, m) in report.bucket_mean_normalized_fct.iter().enumerate() {
        match m {
            Some(m) => println!("  bucket {bucket}: {m:.3}"),
            None => println!("  bucket {bucket}: n/a"),
        }
    }
}

// ─── CLI Parsing ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum QdiscChoice {
    Pfabric,
    Fifo,
    Both,
}

struct Args {
    sim: SimConfig,
    qdisc: QdiscChoice,
    limit: Option<u32>,
    fifo_limit: u32,
    tc: Option<String>,
    config_path: Option<String>,
    report: Option<String>,
    json: bool,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> anyhow::Result<&'a String> {
    args.get(i)
        .ok_or_else(|| anyhow::anyhow!("{flag} requires a value"))
}

fn number<T>(args: &[String], i: usize, flag: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let val = value(args, i, flag)?;
    val.parse()
        .map_err(|e| anyhow::anyhow!("invalid {flag} '{}': {}", val, e))
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut sim = SimConfig::default();
    let mut qdisc = QdiscChoice::Pfabric;
    let mut limit = None;
    let mut fifo_limit = FIFO_LIMIT_DEFAULT;
    let mut tc = None;
    let mut config_path = None;
    let mut report = None;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--hosts" | "-n" => {
                i += 1;
                sim.workload.hosts = number(&args, i, flag)?;
            }
            "--flows" | "-f" => {
                i += 1;
                sim.workload.flows_per_host = number(&args, i, flag)?;
            }
            "--seed" | "-s" => {
                i += 1;
                sim.workload.seed = number(&args, i, flag)?;
            }
            "--spread" => {
                i += 1;
                sim.workload.start_spread = number(&args, i, flag)?;
            }
            "--size-divisor" => {
                i += 1;
                sim.workload.size_divisor = number(&args, i, flag)?;
            }
            "--bw-mbit" | "-B" => {
                i += 1;
                let mbit: f64 = number(&args, i, flag)?;
                if mbit <= 0.0 {
                    anyhow::bail!("--bw-mbit must be positive");
                }
                sim.link = LinkModel::with_mbit(mbit);
            }
            "--window" | "-w" => {
                i += 1;
                sim.sender.initial_window = number(&args, i, flag)?;
            }
            "--max-window" => {
                i += 1;
                sim.sender.max_window = number(&args, i, flag)?;
            }
            "--rto" => {
                i += 1;
                sim.sender.rto = number(&args, i, flag)?;
            }
            "--ack-delay" => {
                i += 1;
                sim.ack_delay = number(&args, i, flag)?;
            }
            "--max-ticks" => {
                i += 1;
                sim.max_ticks = number(&args, i, flag)?;
            }
            "--progress" => {
                i += 1;
                sim.progress_every = number(&args, i, flag)?;
            }
            "--policy" | "-p" => {
                i += 1;
                let val = value(&args, i, flag)?;
                sim.policy = PriorityPolicy::parse(val)
                    .ok_or_else(|| anyhow::anyhow!("unknown priority policy '{}'", val))?;
            }
            "--qdisc" | "-q" => {
                i += 1;
                qdisc = match value(&args, i, flag)?.as_str() {
                    "pfabric" => QdiscChoice::Pfabric,
                    "fifo" | "pfifo" => QdiscChoice::Fifo,
                    "both" => QdiscChoice::Both,
                    other => anyhow::bail!("unknown qdisc '{other}' (pfabric, fifo, both)"),
                };
            }
            "--limit" | "-l" => {
                i += 1;
                limit = Some(number(&args, i, flag)?);
            }
            "--fifo-limit" => {
                i += 1;
                fifo_limit = number(&args, i, flag)?;
            }
            "--tc" => {
                i += 1;
                tc = Some(value(&args, i, flag)?.clone());
            }
            "--config" | "-c" => {
                i += 1;
                config_path = Some(value(&args, i, flag)?.clone());
            }
            "--report" | "-r" => {
                i += 1;
                let val = value(&args, i, flag)?;
                if !matches!(val.as_str(), "text" | "csv" | "prometheus") {
                    anyhow::bail!("unknown report format '{val}' (text, csv, prometheus)");
                }
                report = Some(val.clone());
            }
            "--json" => json = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                anyhow::bail!("unknown argument: {other}\nRun with --help for usage.");
            }
        }
        i += 1;
    }

    if sim.workload.hosts == 0 || sim.workload.flows_per_host == 0 {
        anyhow::bail!("need at least one host and one flow per host");
    }
    if sim.workload.hosts > usize::from(u8::MAX) {
        anyhow::bail!("at most {} hosts", u8::MAX);
    }

    Ok(Args {
        sim,
        qdisc,
        limit,
        fifo_limit,
        tc,
        config_path,
        report,
        json,
    })
}

fn print_help() {
    eprintln!(
        r#"pfabric-sim: bottleneck simulation of the pFabric scheduler

USAGE:
  pfabric-sim [OPTIONS]

WORKLOAD:
  --hosts, -n <n>         Sending hosts (default 2)
  --flows, -f <n>         Flows per host (default 8)
  --seed, -s <n>          Seed for start-time jitter (default 1)
  --spread <ticks>        Start times drawn from 0..=ticks (default 0)
  --size-divisor <n>      Divide every flow size by n (default 1)

LINK AND SENDERS:
  --bw-mbit, -B <mbit>    Egress link bandwidth (default 100)
  --window, -w <pkts>     Initial window (default 4)
  --max-window <pkts>     Window cap (default 64)
  --rto <ticks>           Retransmission timeout (default 40)
  --ack-delay <ticks>     Delivery to ack delay (default 4)
  --max-ticks <n>         Stop after n ticks (default 5000000)
  --progress <ticks>      Log progress every n ticks

QUEUEING:
  --qdisc, -q <name>      pfabric, fifo or both (default pfabric)
  --policy, -p <name>     remaining, bucket or a fixed band (default remaining)
  --limit, -l <pkts>      pFabric buffer limit (default 15)
  --fifo-limit <pkts>     Drop-tail buffer limit (default 150)
  --tc "<options>"        pFabric options: [ limit PACKETS ] [ disable_dequeue ] [ enable_dequeue ]
  --config, -c <file>     pFabric scheduler config (TOML)

OUTPUT:
  --report, -r <fmt>      Print scheduler stats to stderr: text, csv, prometheus
  --json                  JSON reports on stdout

ENVIRONMENT:
  RUST_LOG                Log filter (default info)"#
    );
}
