//! # ODrive Driver
//!
//! 关节空间与 ODrive 设备之间的桥接层。
//!
//! ## 模块
//!
//! - `config`: TOML 配置与校验
//! - `channels`: 输入通道与优先级选择
//! - `command`: 出站消息类型
//! - `axis`: 单轴换算、解析和模式切换计划
//! - `controller`: 多轴读写周期与模式切换状态机
//! - `system`: 宿主框架生命周期封装
//!
//! ## 示例
//!
//! ```no_run
//! use odrive_driver::{EnabledChannels, OdriveSystem, SystemConfig};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SystemConfig::load("odrive.toml")?;
//! let mut system = OdriveSystem::on_init(config)?;
//! system.on_configure()?;
//!
//! let period = Duration::from_millis(10);
//! // 位置种子取自最近一次读周期的估计值
//! system.read(Duration::ZERO, period)?;
//! system.on_activate()?;
//! system.set_enabled_channels(0, EnabledChannels::position_only())?;
//!
//! system.read(period, period)?;
//! system.write(period, period)?;
//! system.on_deactivate()?;
//! # Ok(())
//! # }
//! ```

pub mod axis;
pub mod channels;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod system;

pub use axis::{Axis, AxisCommand, AxisState};
pub use channels::{EnabledChannels, InterfaceKind, SelectedChannel, split_interface_name};
pub use command::{AxisMessage, MessageBuffer};
pub use config::{AxisConfig, ConfigError, SystemConfig, validate_axes};
pub use controller::Controller;
pub use error::DriverError;
pub use system::{BoxedCanAdapter, InterfaceDescriptor, OdriveSystem};

pub use odrive_can::{CanAdapter, CanError, OdriveFrame};
