//! 消息结构体定义
//!
//! 每种消息都有固定的命令 ID、固定的负载长度和确定的小端布局。
//! 字段保持线上原始类型（u32 / f32 / i16 缩放值），物理单位换算在驱动层完成。

use crate::ids::*;
use crate::{
    AxisRequestedState, ControlMode, InputMode, OdriveFrame, ProtocolError, decode_scaled_i16,
    encode_scaled_i16, read_f32_le, read_i16_le, read_u32_le,
};

/// Set_Input_Pos 中 Vel_FF / Torque_FF 的定点缩放系数
pub const FF_SCALE: f32 = 0.001;

/// CAN 消息的公共接口
///
/// - `encode` 只写前 `MSG_LENGTH` 字节，其余为 0
/// - `decode` 要求 `data.len() >= MSG_LENGTH`，长度检查由调用方负责；
///   需要检查时使用 [`CanMessage::from_frame`]
pub trait CanMessage: Sized {
    const CMD_ID: u8;
    const MSG_LENGTH: usize;

    fn encode(&self) -> [u8; 8];

    fn decode(data: &[u8]) -> Self;

    /// 编码为发往 `node_id` 的 CAN 帧
    fn to_frame(&self, node_id: u8) -> Result<OdriveFrame, ProtocolError> {
        let id = arbitration_id(node_id, Self::CMD_ID)?;
        let data = self.encode();
        Ok(OdriveFrame::new(id, &data[..Self::MSG_LENGTH]))
    }

    /// 从 CAN 帧解码（校验命令 ID 和长度）
    fn from_frame(frame: &OdriveFrame) -> Result<Self, ProtocolError> {
        let cmd_id = frame.cmd_id();
        if cmd_id != Self::CMD_ID {
            return Err(ProtocolError::UnexpectedCommand {
                expected: Self::CMD_ID,
                actual: cmd_id,
            });
        }
        check_length::<Self>(frame)?;
        Ok(Self::decode(frame.data_slice()))
    }
}

/// 校验帧长度不少于消息要求的长度
pub fn check_length<M: CanMessage>(frame: &OdriveFrame) -> Result<(), ProtocolError> {
    if (frame.len as usize) < M::MSG_LENGTH {
        return Err(ProtocolError::InvalidLength {
            cmd_id: M::CMD_ID,
            expected: M::MSG_LENGTH,
            actual: frame.len as usize,
        });
    }
    Ok(())
}

// ============================================================================
// 出站消息（主机 -> 设备）
// ============================================================================

/// 请求轴状态 (0x07)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetAxisState {
    pub axis_requested_state: u32, // Byte 0-3
}

impl SetAxisState {
    pub fn new(state: AxisRequestedState) -> Self {
        Self {
            axis_requested_state: state.into(),
        }
    }

    pub fn idle() -> Self {
        Self::new(AxisRequestedState::Idle)
    }

    pub fn closed_loop_control() -> Self {
        Self::new(AxisRequestedState::ClosedLoopControl)
    }

    pub fn requested_state(&self) -> Result<AxisRequestedState, ProtocolError> {
        AxisRequestedState::try_from(self.axis_requested_state).map_err(|_| {
            ProtocolError::InvalidValue {
                field: "Axis_Requested_State",
                value: self.axis_requested_state,
            }
        })
    }
}

impl CanMessage for SetAxisState {
    const CMD_ID: u8 = SET_AXIS_STATE;
    const MSG_LENGTH: usize = 4;

    fn encode(&self) -> [u8; 8] {
        let mut data = [0u8; 8];
        data[0..4].copy_from_slice(&self.axis_requested_state.to_le_bytes());
        data
    }

    fn decode(data: &[u8]) -> Self {
        Self {
            axis_requested_state: read_u32_le(data, 0),
        }
    }
}

/// 设置控制模式 (0x0B)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetControllerMode {
    pub control_mode: u32, // Byte 0-3
    pub input_mode: u32,   // Byte 4-7
}

impl SetControllerMode {
    pub fn new(control_mode: ControlMode, input_mode: InputMode) -> Self {
        Self {
            control_mode: control_mode.into(),
            input_mode: input_mode.into(),
        }
    }

    /// 直通输入模式下的控制模式切换
    pub fn passthrough(control_mode: ControlMode) -> Self {
        Self::new(control_mode, InputMode::Passthrough)
    }

    pub fn mode(&self) -> Result<ControlMode, ProtocolError> {
        ControlMode::try_from(self.control_mode).map_err(|_| ProtocolError::InvalidValue {
            field: "Control_Mode",
            value: self.control_mode,
        })
    }
}

impl CanMessage for SetControllerMode {
    const CMD_ID: u8 = SET_CONTROLLER_MODE;
    const MSG_LENGTH: usize = 8;

    fn encode(&self) -> [u8; 8] {
        let mut data = [0u8; 8];
        data[0..4].copy_from_slice(&self.control_mode.to_le_bytes());
        data[4..8].copy_from_slice(&self.input_mode.to_le_bytes());
        data
    }

    fn decode(data: &[u8]) -> Self {
        Self {
            control_mode: read_u32_le(data, 0),
            input_mode: read_u32_le(data, 4),
        }
    }
}

/// 位置设定值 (0x0C)
///
/// 单位：input_pos [rev]，vel_ff [rev/s]，torque_ff [N·m]。
/// 两个前馈项在线上是 i16，缩放系数 0.001。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetInputPos {
    pub input_pos: f32, // Byte 0-3
    pub vel_ff: f32,    // Byte 4-5 (i16 × 0.001)
    pub torque_ff: f32, // Byte 6-7 (i16 × 0.001)
}

impl CanMessage for SetInputPos {
    const CMD_ID: u8 = SET_INPUT_POS;
    const MSG_LENGTH: usize = 8;

    fn encode(&self) -> [u8; 8] {
        let mut data = [0u8; 8];
        data[0..4].copy_from_slice(&self.input_pos.to_le_bytes());
        data[4..6].copy_from_slice(&encode_scaled_i16(self.vel_ff, FF_SCALE).to_le_bytes());
        data[6..8].copy_from_slice(&encode_scaled_i16(self.torque_ff, FF_SCALE).to_le_bytes());
        data
    }

    fn decode(data: &[u8]) -> Self {
        Self {
            input_pos: read_f32_le(data, 0),
            vel_ff: decode_scaled_i16(read_i16_le(data, 4), FF_SCALE),
            torque_ff: decode_scaled_i16(read_i16_le(data, 6), FF_SCALE),
        }
    }
}

/// 速度设定值 (0x0D)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetInputVel {
    pub input_vel: f32,       // Byte 0-3 [rev/s]
    pub input_torque_ff: f32, // Byte 4-7 [N·m]
}

impl CanMessage for SetInputVel {
    const CMD_ID: u8 = SET_INPUT_VEL;
    const MSG_LENGTH: usize = 8;

    fn encode(&self) -> [u8; 8] {
        let mut data = [0u8; 8];
        data[0..4].copy_from_slice(&self.input_vel.to_le_bytes());
        data[4..8].copy_from_slice(&self.input_torque_ff.to_le_bytes());
        data
    }

    fn decode(data: &[u8]) -> Self {
        Self {
            input_vel: read_f32_le(data, 0),
            input_torque_ff: read_f32_le(data, 4),
        }
    }
}

/// 力矩设定值 (0x0E)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetInputTorque {
    pub input_torque: f32, // Byte 0-3 [N·m]
}

impl CanMessage for SetInputTorque {
    const CMD_ID: u8 = SET_INPUT_TORQUE;
    const MSG_LENGTH: usize = 4;

    fn encode(&self) -> [u8; 8] {
        let mut data = [0u8; 8];
        data[0..4].copy_from_slice(&self.input_torque.to_le_bytes());
        data
    }

    fn decode(data: &[u8]) -> Self {
        Self {
            input_torque: read_f32_le(data, 0),
        }
    }
}

/// 清除错误 (0x18)
///
/// `identify` 非 0 时设备会闪灯，本驱动始终发 0。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearErrors {
    pub identify: u8, // Byte 0
}

impl CanMessage for ClearErrors {
    const CMD_ID: u8 = CLEAR_ERRORS;
    const MSG_LENGTH: usize = 1;

    fn encode(&self) -> [u8; 8] {
        let mut data = [0u8; 8];
        data[0] = self.identify;
        data
    }

    fn decode(data: &[u8]) -> Self {
        Self { identify: data[0] }
    }
}

// ============================================================================
// 入站消息（设备 -> 主机）
// ============================================================================

/// 编码器估计值 (0x09)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GetEncoderEstimates {
    pub pos_estimate: f32, // Byte 0-3 [rev]
    pub vel_estimate: f32, // Byte 4-7 [rev/s]
}

impl CanMessage for GetEncoderEstimates {
    const CMD_ID: u8 = GET_ENCODER_ESTIMATES;
    const MSG_LENGTH: usize = 8;

    fn encode(&self) -> [u8; 8] {
        let mut data = [0u8; 8];
        data[0..4].copy_from_slice(&self.pos_estimate.to_le_bytes());
        data[4..8].copy_from_slice(&self.vel_estimate.to_le_bytes());
        data
    }

    fn decode(data: &[u8]) -> Self {
        Self {
            pos_estimate: read_f32_le(data, 0),
            vel_estimate: read_f32_le(data, 4),
        }
    }
}

/// 力矩目标值/估计值 (0x1C)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GetTorques {
    pub torque_target: f32,   // Byte 0-3 [N·m]
    pub torque_estimate: f32, // Byte 4-7 [N·m]
}

impl CanMessage for GetTorques {
    const CMD_ID: u8 = GET_TORQUES;
    const MSG_LENGTH: usize = 8;

    fn encode(&self) -> [u8; 8] {
        let mut data = [0u8; 8];
        data[0..4].copy_from_slice(&self.torque_target.to_le_bytes());
        data[4..8].copy_from_slice(&self.torque_estimate.to_le_bytes());
        data
    }

    fn decode(data: &[u8]) -> Self {
        Self {
            torque_target: read_f32_le(data, 0),
            torque_estimate: read_f32_le(data, 4),
        }
    }
}
