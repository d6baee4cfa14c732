//! 硬件接口生命周期
//!
//! `OdriveSystem` 按宿主框架的钩子顺序组织：
//!
//! ```text
//! on_init ──> on_configure ──> on_activate ──> read / write ... ──> on_deactivate ──> on_cleanup
//! ```
//!
//! - `on_init`: 校验配置，导出接口
//! - `on_configure`: 打开 SocketCAN，创建 [`Controller`]
//! - `on_cleanup`: 关闭传输
//!
//! 配置之前调用需要传输的方法返回 [`DriverError::NotConfigured`]。

use crate::channels::{EnabledChannels, InterfaceKind};
use crate::config::SystemConfig;
use crate::controller::Controller;
use crate::error::DriverError;
use odrive_can::CanAdapter;
use std::fmt;
use std::time::Duration;
use tracing::info;

/// 动态分发的 CAN 适配器
pub type BoxedCanAdapter = Box<dyn CanAdapter + Send>;

/// 导出的接口描述（`"<joint>/<kind>"`）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceDescriptor {
    pub joint: String,
    pub kind: InterfaceKind,
}

impl InterfaceDescriptor {
    pub fn name(&self) -> String {
        format!("{}/{}", self.joint, self.kind)
    }
}

impl fmt::Display for InterfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.joint, self.kind)
    }
}

/// ODrive 硬件系统
pub struct OdriveSystem {
    config: SystemConfig,
    controller: Option<Controller<BoxedCanAdapter>>,
}

impl OdriveSystem {
    /// 校验配置（失败时不创建任何轴）
    pub fn on_init(config: SystemConfig) -> Result<Self, DriverError> {
        let config = config.validated()?;
        info!(
            "ODrive system initialized: interface '{}', {} axes",
            config.can,
            config.axes.len()
        );
        Ok(Self {
            config,
            controller: None,
        })
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// 打开配置中的 SocketCAN 接口
    #[cfg(target_os = "linux")]
    pub fn on_configure(&mut self) -> Result<(), DriverError> {
        let adapter = odrive_can::SocketCanAdapter::new(self.config.can.clone())?;
        self.configure_with(Box::new(adapter))
    }

    #[cfg(not(target_os = "linux"))]
    pub fn on_configure(&mut self) -> Result<(), DriverError> {
        Err(DriverError::Can(odrive_can::CanError::Device(
            odrive_can::CanDeviceError::new(
                odrive_can::CanDeviceErrorKind::Backend,
                "SocketCAN is only available on Linux",
            ),
        )))
    }

    /// 使用指定的适配器完成配置（测试或其他后端）
    pub fn configure_with(&mut self, adapter: BoxedCanAdapter) -> Result<(), DriverError> {
        let controller = Controller::new(self.config.axes.clone(), adapter)?;
        self.controller = Some(controller);
        info!("ODrive system configured on '{}'", self.config.can);
        Ok(())
    }

    /// 释放传输
    pub fn on_cleanup(&mut self) {
        if self.controller.take().is_some() {
            info!("ODrive system cleaned up");
        }
    }

    pub fn is_configured(&self) -> bool {
        self.controller.is_some()
    }

    pub fn controller(&self) -> Option<&Controller<BoxedCanAdapter>> {
        self.controller.as_ref()
    }

    pub fn controller_mut(&mut self) -> Result<&mut Controller<BoxedCanAdapter>, DriverError> {
        self.controller.as_mut().ok_or(DriverError::NotConfigured)
    }

    pub fn on_activate(&mut self) -> Result<(), DriverError> {
        self.controller_mut()?.activate();
        Ok(())
    }

    pub fn on_deactivate(&mut self) -> Result<(), DriverError> {
        self.controller_mut()?.deactivate();
        Ok(())
    }

    pub fn read(&mut self, timestamp: Duration, period: Duration) -> Result<usize, DriverError> {
        Ok(self.controller_mut()?.read(timestamp, period))
    }

    pub fn write(&mut self, timestamp: Duration, period: Duration) -> Result<usize, DriverError> {
        Ok(self.controller_mut()?.write(timestamp, period))
    }

    pub fn set_enabled_channels(
        &mut self,
        index: usize,
        channels: EnabledChannels,
    ) -> Result<(), DriverError> {
        self.controller_mut()?.set_enabled_channels(index, channels)
    }

    pub fn perform_command_mode_switch<S: AsRef<str>>(
        &mut self,
        start: &[S],
        stop: &[S],
    ) -> Result<usize, DriverError> {
        Ok(self
            .controller_mut()?
            .perform_command_mode_switch(start, stop))
    }

    /// 状态接口：每个关节依次为 effort、velocity、position
    pub fn export_state_interfaces(&self) -> Vec<InterfaceDescriptor> {
        self.interfaces()
    }

    /// 命令接口：与状态接口同名同序
    pub fn export_command_interfaces(&self) -> Vec<InterfaceDescriptor> {
        self.interfaces()
    }

    /// 读取状态接口的当前值；未配置或关节未知时返回 `None`
    pub fn state_value(&self, interface: &InterfaceDescriptor) -> Option<f64> {
        self.controller
            .as_ref()?
            .state_value(&interface.joint, interface.kind)
    }

    /// 命令接口绑定的设定值；未配置或关节未知时返回 `None`
    pub fn command_value_mut(&mut self, interface: &InterfaceDescriptor) -> Option<&mut f64> {
        self.controller
            .as_mut()?
            .command_value_mut(&interface.joint, interface.kind)
    }

    fn interfaces(&self) -> Vec<InterfaceDescriptor> {
        self.config
            .axes
            .iter()
            .flat_map(|axis| {
                InterfaceKind::ALL.into_iter().map(|kind| InterfaceDescriptor {
                    joint: axis.name.clone(),
                    kind,
                })
            })
            .collect()
    }
}

impl fmt::Debug for OdriveSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdriveSystem")
            .field("config", &self.config)
            .field("controller", &self.controller)
            .finish()
    }
}
