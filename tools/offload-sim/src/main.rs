use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};
use offload_sim::{Board, Faults, Session, Summary};

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate SPI offload PWM triggers on a host")]
struct Opts {
    /// JSON board description
    #[arg(value_name = "BOARD")]
    board: PathBuf,

    /// Write the sampling frequency attribute (repeatable, applied in order)
    #[arg(long = "set-rate", value_name = "HZ")]
    set_rate: Vec<String>,

    /// Trigger to address when more than one is registered
    #[arg(long, value_name = "NAME")]
    trigger: Option<String>,

    /// Remove a device after probing (repeatable, applied in order)
    #[arg(long = "remove", value_name = "DEVICE")]
    remove: Vec<String>,

    #[arg(long = "fail-pwm")]
    fail_pwm: bool,

    #[arg(long = "fail-pwm-enable")]
    fail_pwm_enable: bool,

    #[arg(long = "fail-dma")]
    fail_dma: bool,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "error".red().bold(),
            Level::Warn => "warn ".yellow().bold(),
            Level::Info => "info ".green(),
            Level::Debug => "debug".blue(),
            Level::Trace => "trace".dimmed(),
        };
        eprintln!("{tag} {}", record.args());
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn print_summary(summary: &Summary) {
    println!("{}", "devices".bold());
    for dev in &summary.devices {
        let status = if dev.status.starts_with("bound") {
            dev.status.green()
        } else if dev.status.starts_with("failed") {
            dev.status.red()
        } else {
            dev.status.yellow()
        };
        match &dev.trigger {
            Some(trigger) => println!("  {:<16} {status} [{trigger}]", dev.name),
            None => println!("  {:<16} {status}", dev.name),
        }
    }

    println!("{}", "triggers".bold());
    for trig in &summary.triggers {
        let rate = trig
            .sampling_frequency
            .map(|hz| format!("{hz} Hz"))
            .unwrap_or_else(|| "-".to_string());
        let pwm = match trig.pwm_enabled {
            Some(true) => "running".green(),
            Some(false) => "stopped".yellow(),
            None => "-".normal(),
        };
        println!(
            "  {:<32} {:<10} pwm {pwm} refs {} ({})",
            trig.name, rate, trig.refs, trig.kind
        );
    }
    println!("live buffers: {}", summary.live_buffers);
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    init_logging(opts.verbose);

    let board = Board::load(&opts.board)?;
    let faults = Faults {
        pwm_request: opts.fail_pwm,
        pwm_enable: opts.fail_pwm_enable,
        dma_alloc: opts.fail_dma,
    };
    let session = Session::new(&board, faults)?;

    let report = session.probe();
    log::info!(
        "probe: {} bound, {} deferred, {} failed after {} passes",
        report.bound.len(),
        report.deferred.len(),
        report.failed.len(),
        report.passes
    );

    for value in &opts.set_rate {
        match session.store_rate(opts.trigger.as_deref(), value) {
            Ok(_) => {
                let shown = session.show_rate(opts.trigger.as_deref())?;
                println!("sampling_frequency <- {value}: reads {}", shown.trim_end());
            }
            Err(err) => eprintln!("{} {err}", "rejected".red()),
        }
    }

    for name in &opts.remove {
        session.remove(name)?;
    }

    let summary = session.summary();
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}
