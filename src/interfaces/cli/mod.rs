//! CLI Interface Module
//!
//! Runs one order book simulation from the command line.
//!
//! ## Responsibilities
//! - Parse command-line arguments
//! - Initialize logging
//! - Build the simulation config and run it
//! - Print the summary (and optionally the Prometheus metrics)

use crate::application::services::{Simulation, SimulationConfig, SimulationSummary};
use crate::domain::orderbook::BookConfig;
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{DEFAULT_QUEUE_CAPACITY, TICKER_COUNT};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;

/// 订单簿模拟命令行配置
#[derive(Parser, Debug, Clone)]
#[command(name = "lockfree-book")]
#[command(version)]
#[command(about = "无锁订单簿模拟：多生产者下单，单撮合线程周期撮合", long_about = None)]
pub struct CliConfig {
    /// 模拟时长（秒）
    #[arg(short = 'd', long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
    pub duration_secs: u64,

    /// 生产者线程数（0表示自动检测CPU核心数）
    #[arg(short = 'n', long, default_value_t = 3)]
    pub producers: usize,

    /// 每个生产者两次下单之间的间隔（毫秒）
    #[arg(long, default_value_t = 50)]
    pub submit_interval_ms: u64,

    /// 两轮撮合之间的间隔（毫秒）
    #[arg(long, default_value_t = 500)]
    pub match_interval_ms: u64,

    /// 每个买/卖队列的容量（必须是2的幂）
    #[arg(short = 'q', long, default_value_t = DEFAULT_QUEUE_CAPACITY, value_parser = parse_capacity)]
    pub queue_capacity: usize,

    /// ticker数量
    #[arg(short = 't', long, default_value_t = TICKER_COUNT, value_parser = parse_tickers)]
    pub tickers: usize,

    /// 随机订单的最大数量
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_quantity: u32,

    /// 随机种子（用于复现）
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// 撮合线程绑核
    #[arg(long, default_value_t = false)]
    pub cpu_affinity: bool,

    /// 日志级别
    #[arg(short = 'l', long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: String,

    /// 以JSON输出汇总
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// 结束后打印Prometheus指标
    #[arg(long, default_value_t = false)]
    pub print_metrics: bool,

    /// 仅显示配置不运行（用于调试）
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl CliConfig {
    /// 转换为模拟配置
    pub fn simulation_config(&self) -> SimulationConfig {
        // 0 表示按CPU核心数
        let producers = if self.producers == 0 {
            num_cpus::get()
        } else {
            self.producers
        };

        SimulationConfig {
            duration: Duration::from_secs(self.duration_secs),
            producers,
            submit_interval: Duration::from_millis(self.submit_interval_ms),
            match_interval: Duration::from_millis(self.match_interval_ms),
            max_quantity: self.max_quantity,
            seed: self.seed,
            pin_matcher: self.cpu_affinity,
            book: BookConfig {
                ticker_count: self.tickers,
                queue_capacity: self.queue_capacity,
                ..Default::default()
            },
        }
    }
}

fn parse_capacity(raw: &str) -> Result<usize, String> {
    let capacity: usize = raw
        .parse()
        .map_err(|e| format!("invalid capacity '{}': {}", raw, e))?;
    if capacity == 0 || !capacity.is_power_of_two() {
        return Err(format!("capacity must be a power of two, got {}", capacity));
    }
    Ok(capacity)
}

fn parse_tickers(raw: &str) -> Result<usize, String> {
    let tickers: usize = raw
        .parse()
        .map_err(|e| format!("invalid ticker count '{}': {}", raw, e))?;
    if tickers == 0 || tickers > TICKER_COUNT {
        return Err(format!("ticker count must be within 1..={}, got {}", TICKER_COUNT, tickers));
    }
    Ok(tickers)
}

/// Runs the CLI application
pub fn run() -> ExitCode {
    let config = CliConfig::parse();

    init_logging(&config.log_level);
    tracing::debug!("配置: {:?}", config);

    let sim_config = config.simulation_config();

    println!("========================================");
    println!("  无锁订单簿模拟 v{}", env!("CARGO_PKG_VERSION"));
    println!("========================================");
    println!("模拟时长:     {}s", config.duration_secs);
    println!("生产者数量:   {}", sim_config.producers);
    println!("ticker数量:   {}", sim_config.book.ticker_count);
    println!("队列容量:     {}", sim_config.book.queue_capacity);
    println!("下单间隔:     {}ms", config.submit_interval_ms);
    println!("撮合间隔:     {}ms", config.match_interval_ms);
    println!("日志级别:     {}", config.log_level);
    println!("========================================");

    if config.dry_run {
        println!("\nDry-run 模式 - 不运行模拟");
        return ExitCode::SUCCESS;
    }

    let summary = match Simulation::new(sim_config).run() {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("simulation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                tracing::error!("failed to encode summary: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_summary(&summary);
    }

    if config.print_metrics {
        match METRICS.export() {
            Ok(text) => println!("\n{}", text),
            Err(e) => tracing::warn!("failed to export metrics: {}", e),
        }
    }

    println!("Simulation complete.");
    ExitCode::SUCCESS
}

fn print_summary(summary: &SimulationSummary) {
    println!("\n--- 模拟结果 ---");
    println!("提交订单数:   {}", summary.submitted);
    println!("接受 / 拒绝:  {} / {}", summary.accepted, summary.rejected);
    println!("撮合轮数:     {}", summary.sweeps);
    println!("成交笔数:     {}", summary.fills);
    println!("成交数量:     {}", summary.filled_quantity);
    println!("回灌丢单:     {}", summary.reinjection_drops);
    println!("驻留买/卖单:  {} / {}", summary.resident_buys, summary.resident_sells);
}

/// 初始化日志系统
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config_default() {
        let config = CliConfig::parse_from(["lockfree-book"]);
        assert_eq!(config.duration_secs, 2);
        assert_eq!(config.producers, 3);
        assert_eq!(config.submit_interval_ms, 50);
        assert_eq!(config.match_interval_ms, 500);
        assert_eq!(config.queue_capacity, 128);
        assert_eq!(config.tickers, 1024);
        assert_eq!(config.seed, None);
        assert_eq!(config.log_level, "info");
        assert!(!config.json);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_cli_config_custom() {
        let config = CliConfig::parse_from([
            "lockfree-book",
            "--duration-secs", "5",
            "--producers", "8",
            "--submit-interval-ms", "0",
            "--match-interval-ms", "100",
            "--queue-capacity", "256",
            "--tickers", "16",
            "--seed", "42",
            "--log-level", "debug",
            "--json",
            "--print-metrics",
        ]);

        let sim = config.simulation_config();
        assert_eq!(sim.duration, Duration::from_secs(5));
        assert_eq!(sim.producers, 8);
        assert!(sim.submit_interval.is_zero());
        assert_eq!(sim.match_interval, Duration::from_millis(100));
        assert_eq!(sim.book.queue_capacity, 256);
        assert_eq!(sim.book.ticker_count, 16);
        assert_eq!(sim.seed, Some(42));
        assert!(config.json);
        assert!(config.print_metrics);
    }

    #[test]
    fn test_cli_config_short_flags() {
        let config = CliConfig::parse_from([
            "lockfree-book", "-d", "3", "-n", "0", "-q", "64", "-t", "4", "-s", "1", "-l", "warn",
        ]);

        assert_eq!(config.duration_secs, 3);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.tickers, 4);
        // 0 个生产者表示按CPU核心数
        assert!(config.simulation_config().producers >= 1);
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(CliConfig::try_parse_from(["lockfree-book", "-q", "100"]).is_err());
        assert!(CliConfig::try_parse_from(["lockfree-book", "-q", "0"]).is_err());
        assert!(CliConfig::try_parse_from(["lockfree-book", "-d", "0"]).is_err());
        assert!(CliConfig::try_parse_from(["lockfree-book", "-t", "2000"]).is_err());
    }
}
