//! # mapapi CLI
//!
//! 在模拟引擎上演示跨线程代理对象。
//!
//! ```bash
//! # 运行模拟（5 个定位标记，20 步）
//! mapapi-cli simulate --positioners 5 --steps 20
//!
//! # 使用配置文件
//! mapapi-cli --config ./cli.toml simulate
//!
//! # 查看生效的配置
//! mapapi-cli config show
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod settings;

use commands::{ConfigCommand, SimulateCommand};
use settings::CliConfig;

/// mapapi CLI - 跨线程代理演示工具
#[derive(Parser, Debug)]
#[command(name = "mapapi-cli")]
#[command(about = "Drive mapapi proxies against a simulated native engine", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（TOML）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 运行模拟
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    mapapi_sdk::init_logging_with("mapapi_cli=info")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(cli.config.as_deref()),
        Commands::Simulate { args } => {
            let config = CliConfig::load(cli.config.as_deref())?;
            args.execute(config)
        },
    }
}
