//! 多轴控制器
//!
//! `Controller` 独占持有 CAN 适配器，按周期执行：
//! - `read`: 排空接收队列，按节点地址分发到各轴，再统一换算到关节空间
//! - `write`: 每个轴最多下发一条设定值消息
//!
//! 以及模式切换状态机（激活/失能、通道变化）。
//!
//! 所有入口都是同步、非阻塞的；多个调用方需要在外部串行化（例如每个控制器一把 `Mutex`）。

use crate::axis::Axis;
use crate::channels::{EnabledChannels, InterfaceKind, split_interface_name};
use crate::config::{AxisConfig, validate_axes};
use crate::error::DriverError;
use odrive_can::{CanAdapter, OdriveFrame};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// ODrive 多轴控制器
pub struct Controller<A: CanAdapter> {
    can: A,
    axes: Vec<Axis>,
    /// 系统是否处于激活状态
    active: bool,
    /// 最近一次读周期的时间戳
    last_read: Option<Duration>,
}

impl<A: CanAdapter> Controller<A> {
    /// 校验轴配置并创建控制器（初始为未激活状态）
    pub fn new(configs: Vec<AxisConfig>, can: A) -> Result<Self, DriverError> {
        let axes = validate_axes(configs)?.into_iter().map(Axis::new).collect();
        Ok(Self {
            can,
            axes,
            active: false,
            last_read: None,
        })
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis(&self, index: usize) -> Option<&Axis> {
        self.axes.get(index)
    }

    /// 可变访问（修改 `command`）
    pub fn axis_mut(&mut self, index: usize) -> Option<&mut Axis> {
        self.axes.get_mut(index)
    }

    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|axis| axis.name() == name)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_read_timestamp(&self) -> Option<Duration> {
        self.last_read
    }

    /// 状态接口 `<joint>/<kind>` 的当前值；未知关节返回 `None`
    pub fn state_value(&self, joint: &str, kind: InterfaceKind) -> Option<f64> {
        let index = self.axis_index(joint)?;
        Some(self.axes[index].state_value(kind))
    }

    /// 命令接口 `<joint>/<kind>` 绑定的设定值；未知关节返回 `None`
    pub fn command_value_mut(&mut self, joint: &str, kind: InterfaceKind) -> Option<&mut f64> {
        let index = self.axis_index(joint)?;
        Some(self.axes[index].command_value_mut(kind))
    }

    /// 还没有收到位置估计的轴名
    pub fn axes_missing_position(&self) -> Vec<&str> {
        self.axes
            .iter()
            .filter(|axis| !axis.has_position_estimate())
            .map(Axis::name)
            .collect()
    }

    // ============================================================
    // 模式切换状态机
    // ============================================================

    /// 激活：对所有轴执行模式切换
    pub fn activate(&mut self) {
        self.active = true;
        info!("Activating {} axes", self.axes.len());
        for index in 0..self.axes.len() {
            self.switch_axis_mode(index);
        }
    }

    /// 失能：所有轴请求 Idle
    pub fn deactivate(&mut self) {
        self.active = false;
        info!("Deactivating {} axes", self.axes.len());
        for index in 0..self.axes.len() {
            self.switch_axis_mode(index);
        }
    }

    /// 替换某个轴的通道标志并对该轴执行模式切换
    ///
    /// 即使新旧标志相同也会重新下发切换序列。
    pub fn set_enabled_channels(
        &mut self,
        index: usize,
        channels: EnabledChannels,
    ) -> Result<(), DriverError> {
        let count = self.axes.len();
        let axis = self
            .axes
            .get_mut(index)
            .ok_or(DriverError::AxisOutOfRange { index, count })?;
        *axis.channels_mut() = channels;
        self.switch_axis_mode(index);
        Ok(())
    }

    /// 按接口名切换命令模式
    ///
    /// 先处理 `stop`（清除标志），再处理 `start`（设置标志），
    /// 然后对涉及到的每个轴执行一次模式切换。未知接口名被忽略。
    ///
    /// 返回执行了模式切换的轴数。
    pub fn perform_command_mode_switch<S: AsRef<str>>(&mut self, start: &[S], stop: &[S]) -> usize {
        let mut touched = vec![false; self.axes.len()];

        for (names, enabled) in [(stop, false), (start, true)] {
            for name in names {
                let name = name.as_ref();
                let Some((joint, kind)) = split_interface_name(name) else {
                    debug!("Ignoring unknown interface '{}'", name);
                    continue;
                };
                let Some(index) = self.axis_index(joint) else {
                    debug!("Ignoring interface '{}' of unknown joint", name);
                    continue;
                };
                self.axes[index].channels_mut().set(kind, enabled);
                touched[index] = true;
            }
        }

        let mut switched = 0;
        for (index, _) in touched.iter().enumerate().filter(|(_, t)| **t) {
            self.switch_axis_mode(index);
            switched += 1;
        }
        switched
    }

    /// 对单个轴生成并发送模式切换序列
    fn switch_axis_mode(&mut self, index: usize) {
        let active = self.active;
        let axis = &mut self.axes[index];
        let plan = axis.prepare_mode_switch(active);
        for msg in &plan {
            axis.send(msg, &mut self.can);
        }
    }

    // ============================================================
    // 周期读写
    // ============================================================

    /// 读周期
    ///
    /// 排空接收队列直到没有待处理帧（接收错误记录警告并结束本次排空），
    /// 然后每个轴从原始值重新计算一次关节空间状态。
    ///
    /// 返回分发到某个轴的帧数。
    pub fn read(&mut self, timestamp: Duration, period: Duration) -> usize {
        self.last_read = Some(timestamp);
        let mut routed = 0;

        loop {
            match self.can.try_receive() {
                Ok(Some(frame)) => {
                    if self.on_can_msg(&frame) {
                        routed += 1;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("CAN receive error: {}", e);
                    break;
                },
            }
        }

        for axis in &mut self.axes {
            axis.apply_transmission();
        }

        trace!(
            "read cycle t={:?} period={:?}: {} frames routed",
            timestamp, period, routed
        );
        routed
    }

    /// 把一帧分发给节点地址匹配的轴；没有匹配的轴时静默丢弃
    ///
    /// 返回是否找到了目标轴。
    pub fn on_can_msg(&mut self, frame: &OdriveFrame) -> bool {
        let node_id = frame.node_id();
        match self
            .axes
            .iter_mut()
            .find(|axis| u32::from(axis.node_id()) == node_id)
        {
            Some(axis) => {
                axis.on_can_msg(frame);
                true
            },
            None => false,
        }
    }

    /// 写周期：每个轴按当前通道和当前命令最多发送一条设定值消息
    ///
    /// 返回成功发送的帧数。
    pub fn write(&mut self, timestamp: Duration, period: Duration) -> usize {
        let mut sent = 0;
        for axis in &self.axes {
            let Some(msg) = axis.setpoint_message() else {
                continue;
            };
            if axis.send(&msg, &mut self.can) {
                sent += 1;
            }
        }
        trace!(
            "write cycle t={:?} period={:?}: {} frames sent",
            timestamp, period, sent
        );
        sent
    }
}

impl<A: CanAdapter> std::fmt::Debug for Controller<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("axes", &self.axes)
            .field("active", &self.active)
            .field("last_read", &self.last_read)
            .finish_non_exhaustive()
    }
}
