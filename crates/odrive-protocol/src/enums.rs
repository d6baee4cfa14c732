//! 轴状态 / 控制模式 / 输入模式枚举
//!
//! 数值与 ODrive 固件定义一致，线上以 u32 小端编码。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 请求的轴状态（Set_Axis_State.Axis_Requested_State）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum AxisRequestedState {
    #[default]
    Undefined = 0,
    /// 空闲（失能）
    Idle = 1,
    StartupSequence = 2,
    FullCalibrationSequence = 3,
    MotorCalibration = 4,
    EncoderIndexSearch = 6,
    EncoderOffsetCalibration = 7,
    /// 闭环控制（伺服到设定值）
    ClosedLoopControl = 8,
    LockinSpin = 9,
    EncoderDirFind = 10,
    Homing = 11,
    EncoderHallPolarityCalibration = 12,
    EncoderHallPhaseCalibration = 13,
    AnticoggingCalibration = 14,
}

/// 控制模式（Set_Controller_Mode.Control_Mode）
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum ControlMode {
    Voltage = 0,
    Torque = 1,
    Velocity = 2,
    Position = 3,
}

/// 输入模式（Set_Controller_Mode.Input_Mode）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum InputMode {
    Inactive = 0,
    /// 直通：设定值直接送入控制器
    #[default]
    Passthrough = 1,
    VelRamp = 2,
    PosFilter = 3,
    MixChannels = 4,
    TrapTraj = 5,
    TorqueRamp = 6,
    Mirror = 7,
    Tuning = 8,
}
