//! CLI 配置文件
//!
//! `~/.config/soarm/config.toml`，保存默认串口与波特率。
//! 命令行参数优先于文件内容，文件内容优先于内置默认值。

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// 持久化的 CLI 默认值
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// 默认串口设备路径
    pub port: Option<String>,

    /// 默认波特率
    pub baud: Option<u32>,
}

/// 配置管理子命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写入默认连接参数
    Set {
        /// 串口设备路径
        #[arg(long)]
        port: Option<String>,

        /// 波特率
        #[arg(long)]
        baud: Option<u32>,
    },

    /// 显示当前配置
    Show,
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Set { port, baud } => {
                let mut cfg = load()?;
                if let Some(port) = port {
                    cfg.port = Some(port);
                }
                if let Some(baud) = baud {
                    cfg.baud = Some(baud);
                }
                store(&cfg)?;
                println!("Configuration saved to {}", config_path()?.display());
                Ok(())
            }
            ConfigCommand::Show => {
                let cfg = load()?;
                println!("port: {}", cfg.port.as_deref().unwrap_or("(unset)"));
                match cfg.baud {
                    Some(baud) => println!("baud: {baud}"),
                    None => println!("baud: (unset)"),
                }
                Ok(())
            }
        }
    }
}

fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("cannot determine config directory")?;
    Ok(dir.join("soarm").join("config.toml"))
}

/// 读取配置；文件不存在时返回默认值
pub fn load() -> Result<CliConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let text =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn store(cfg: &CliConfig) -> Result<()> {
    let path = config_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, toml::to_string_pretty(cfg)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
