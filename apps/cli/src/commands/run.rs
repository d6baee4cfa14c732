//! 控制循环命令
//!
//! 激活所有轴并按固定频率执行 read/write，直到收到 Ctrl-C。

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Args};
use odrive_driver::{EnabledChannels, OdriveSystem, SelectedChannel, SystemConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// 控制循环参数
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("channel").multiple(false)))]
pub struct RunCommand {
    /// 读写频率（Hz）
    #[arg(long, default_value_t = 100)]
    pub rate_hz: u32,

    /// 位置模式：保持当前位置（默认）
    #[arg(long, group = "channel")]
    pub position: bool,

    /// 速度模式：速度设定值为 0
    #[arg(long, group = "channel")]
    pub velocity: bool,

    /// 力矩模式：力矩设定值为 0
    #[arg(long, group = "channel")]
    pub torque: bool,

    /// 位置模式激活前等待位置估计的最长时间（毫秒）
    #[arg(long, default_value_t = 1000)]
    pub estimate_timeout_ms: u64,
}

impl RunCommand {
    /// 所有轴使能的通道
    pub fn channels(&self) -> EnabledChannels {
        if self.velocity {
            EnabledChannels::velocity_only()
        } else if self.torque {
            EnabledChannels::torque_only()
        } else {
            EnabledChannels::position_only()
        }
    }

    pub fn period(&self) -> Result<Duration> {
        if self.rate_hz == 0 {
            bail!("--rate-hz must be positive");
        }
        Ok(Duration::from_secs_f64(1.0 / f64::from(self.rate_hz)))
    }

    pub fn execute(&self, config: SystemConfig) -> Result<()> {
        let period = self.period()?;
        let channels = self.channels();

        let mut system = OdriveSystem::on_init(config)?;
        system
            .on_configure()
            .with_context(|| format!("Failed to open CAN interface '{}'", system.config().can))?;

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
            .context("Failed to set Ctrl-C handler")?;

        let start = Instant::now();
        arm(
            &mut system,
            channels,
            Duration::from_millis(self.estimate_timeout_ms),
            period,
        )?;
        info!(
            "Control loop running at {} Hz ({:?}), press Ctrl-C to stop",
            self.rate_hz,
            channels.select()
        );

        let mut next_tick = Instant::now();
        while running.load(Ordering::SeqCst) {
            let timestamp = start.elapsed();
            system.read(timestamp, period)?;
            system.write(timestamp, period)?;

            if let Some(controller) = system.controller() {
                for axis in controller.axes() {
                    let state = axis.state();
                    debug!(
                        "{}: pos={:.4} rad vel={:.4} rad/s torque={:.4} N·m",
                        axis.name(),
                        state.position,
                        state.velocity,
                        state.torque_estimate
                    );
                }
            }

            next_tick += period;
            let now = Instant::now();
            if next_tick > now {
                spin_sleep::sleep(next_tick - now);
            } else {
                warn!(
                    "Control loop overrun by {:?}, skipping sleep",
                    now.duration_since(next_tick)
                );
                next_tick = now;
            }
        }

        info!("Stopping, requesting idle on all axes");
        system.on_deactivate()?;
        system.on_cleanup();
        Ok(())
    }
}

/// 激活系统并按接口名使能通道
///
/// 位置模式下先轮询读周期，直到每个轴都有有限的位置估计（用作位置种子）；
/// 超过 `timeout` 仍缺少估计时返回错误，不激活任何轴。
pub fn arm(
    system: &mut OdriveSystem,
    channels: EnabledChannels,
    timeout: Duration,
    poll: Duration,
) -> Result<()> {
    if channels.select() == SelectedChannel::Position {
        wait_for_position_estimates(system, timeout, poll)?;
    }

    system.on_activate()?;
    let start: Vec<String> = system
        .export_command_interfaces()
        .iter()
        .filter(|interface| channels.get(interface.kind))
        .map(|interface| interface.name())
        .collect();
    system.perform_command_mode_switch(start.as_slice(), &[])?;
    Ok(())
}

fn wait_for_position_estimates(
    system: &mut OdriveSystem,
    timeout: Duration,
    poll: Duration,
) -> Result<()> {
    let start = Instant::now();
    loop {
        system.read(start.elapsed(), poll)?;
        let missing = system.controller_mut()?.axes_missing_position();
        if missing.is_empty() {
            debug!("Position estimates received after {:?}", start.elapsed());
            return Ok(());
        }
        if start.elapsed() >= timeout {
            bail!(
                "No position estimate within {:?} for axes: {}",
                timeout,
                missing.join(", ")
            );
        }
        spin_sleep::sleep(poll);
    }
}
