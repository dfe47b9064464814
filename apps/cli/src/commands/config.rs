//! 配置管理命令

use crate::settings::{CliConfig, default_config_file};
use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置（TOML）
    Show,

    /// 打印默认配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, explicit: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let config = CliConfig::load(explicit)?;
                print!("{}", config.to_toml_string()?);
            },
            ConfigCommand::Path => match default_config_file() {
                Some(path) => println!("{}", path.display()),
                None => println!("(未知配置目录)"),
            },
        }
        Ok(())
    }
}
