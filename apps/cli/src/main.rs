//! # ODrive CLI
//!
//! 基于 SocketCAN 的 ODrive 控制循环工具。
//!
//! ```bash
//! # 只校验配置
//! odrive-cli --config odrive.toml check
//!
//! # 位置模式保持当前位置，100 Hz 读写，Ctrl-C 退出时失能
//! odrive-cli --config odrive.toml run --position
//!
//! # 所有轴请求 Idle
//! odrive-cli --config odrive.toml idle
//! ```
//!
//! 日志级别通过 `RUST_LOG` 控制，默认 `odrive_cli=info,odrive_driver=info`。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use odrive_driver::SystemConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{CheckCommand, IdleCommand, RunCommand};

const DEFAULT_LOG_FILTER: &str = "odrive_cli=info,odrive_driver=info";

/// ODrive CLI - ODrive CAN 控制工具
#[derive(Parser, Debug)]
#[command(name = "odrive-cli")]
#[command(about = "Control loop for ODrive axes over SocketCAN", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true, default_value = "odrive.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 激活并运行读写循环
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 所有轴请求 Idle
    Idle {
        #[command(flatten)]
        args: IdleCommand,
    },

    /// 校验配置并打印导出的接口
    Check {
        #[command(flatten)]
        args: CheckCommand,
    },
}

fn load_config(path: &Path) -> Result<SystemConfig> {
    SystemConfig::load(path).with_context(|| format!("Invalid config {}", path.display()))
}

fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Run { args } => args.execute(config),
        Commands::Idle { args } => args.execute(config),
        Commands::Check { args } => args.execute(config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::try_parse_from(["odrive-cli", "run"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("odrive.toml"));
        match cli.command {
            Commands::Run { args } => {
                assert_eq!(args.rate_hz, 100);
                assert!(!args.velocity && !args.torque);
            },
            other => panic!("Expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["odrive-cli", "idle", "--config", "/tmp/x.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/tmp/x.toml"));
        assert!(matches!(cli.command, Commands::Idle { .. }));
    }

    #[test]
    fn test_channel_flags_are_exclusive() {
        assert!(Cli::try_parse_from(["odrive-cli", "run", "--position", "--torque"]).is_err());
        assert!(Cli::try_parse_from(["odrive-cli", "run", "--velocity", "--rate-hz", "50"]).is_ok());
    }

    #[test]
    fn test_load_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "can = \"can0\"\n[[axes]]\nnode_id = 99\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.toml"));
        assert!(format!("{:#}", err).contains("99"));
    }
}
