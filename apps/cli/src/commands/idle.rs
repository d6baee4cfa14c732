//! Idle 命令
//!
//! 打开 CAN 接口，向每个轴发送一次 `SetAxisState(Idle)`。

use anyhow::{Context, Result};
use clap::Args;
use odrive_driver::{OdriveSystem, SystemConfig};
use tracing::info;

/// Idle 命令参数
#[derive(Args, Debug, Default)]
pub struct IdleCommand {}

impl IdleCommand {
    pub fn execute(&self, config: SystemConfig) -> Result<()> {
        let mut system = OdriveSystem::on_init(config)?;
        system
            .on_configure()
            .with_context(|| format!("Failed to open CAN interface '{}'", system.config().can))?;

        // 未激活状态下的模式切换即 Idle
        system.on_deactivate()?;
        info!("Idle requested on {} axes", system.config().axes.len());

        system.on_cleanup();
        Ok(())
    }
}
