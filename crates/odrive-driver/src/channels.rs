//! 输入通道定义
//!
//! 上层控制器可以同时使能位置/速度/力矩三个输入通道。
//! 通道之间不互斥：非主通道作为前馈项下发。设备控制模式由优先级规则
//! 位置 > 速度 > 力矩 唯一确定，见 [`EnabledChannels::select`]。

use odrive_protocol::ControlMode;
use std::fmt;

/// 接口类型（与 ros2_control 的 hardware interface 名称一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    Position,
    Velocity,
    /// 力矩
    Effort,
}

impl InterfaceKind {
    /// 每个关节导出接口的固定顺序
    pub const ALL: [InterfaceKind; 3] = [
        InterfaceKind::Effort,
        InterfaceKind::Velocity,
        InterfaceKind::Position,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InterfaceKind::Position => "position",
            InterfaceKind::Velocity => "velocity",
            InterfaceKind::Effort => "effort",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "position" => Some(InterfaceKind::Position),
            "velocity" => Some(InterfaceKind::Velocity),
            "effort" => Some(InterfaceKind::Effort),
            _ => None,
        }
    }
}

/// 拆分接口全名 `"<joint>/<kind>"`
///
/// 关节名本身可以包含 `/`，以最后一个 `/` 为界。
pub fn split_interface_name(full_name: &str) -> Option<(&str, InterfaceKind)> {
    let (joint, kind) = full_name.rsplit_once('/')?;
    if joint.is_empty() {
        return None;
    }
    Some((joint, InterfaceKind::from_name(kind)?))
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已使能的输入通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnabledChannels {
    pub position: bool,
    pub velocity: bool,
    pub torque: bool,
}

impl EnabledChannels {
    pub const NONE: Self = Self {
        position: false,
        velocity: false,
        torque: false,
    };

    pub fn new(position: bool, velocity: bool, torque: bool) -> Self {
        Self {
            position,
            velocity,
            torque,
        }
    }

    pub fn position_only() -> Self {
        Self::new(true, false, false)
    }

    pub fn velocity_only() -> Self {
        Self::new(false, true, false)
    }

    pub fn torque_only() -> Self {
        Self::new(false, false, true)
    }

    pub fn get(&self, kind: InterfaceKind) -> bool {
        match kind {
            InterfaceKind::Position => self.position,
            InterfaceKind::Velocity => self.velocity,
            InterfaceKind::Effort => self.torque,
        }
    }

    pub fn set(&mut self, kind: InterfaceKind, enabled: bool) {
        match kind {
            InterfaceKind::Position => self.position = enabled,
            InterfaceKind::Velocity => self.velocity = enabled,
            InterfaceKind::Effort => self.torque = enabled,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.position || self.velocity || self.torque)
    }

    /// 按 位置 > 速度 > 力矩 的优先级选出主通道
    pub fn select(&self) -> SelectedChannel {
        if self.position {
            SelectedChannel::Position
        } else if self.velocity {
            SelectedChannel::Velocity
        } else if self.torque {
            SelectedChannel::Torque
        } else {
            SelectedChannel::None
        }
    }
}

/// 主通道（决定设备控制模式和设定值消息类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedChannel {
    /// 无通道使能：不下发设定值，模式切换时请求 Idle
    None,
    Position,
    Velocity,
    Torque,
}

impl SelectedChannel {
    /// 对应的设备控制模式
    pub fn control_mode(self) -> Option<ControlMode> {
        match self {
            SelectedChannel::None => None,
            SelectedChannel::Position => Some(ControlMode::Position),
            SelectedChannel::Velocity => Some(ControlMode::Velocity),
            SelectedChannel::Torque => Some(ControlMode::Torque),
        }
    }
}
