//! 命令 ID 常量与仲裁 ID 位布局
//!
//! 仲裁 ID = `node_id << 5 | cmd_id`（11 位标准帧：高 6 位节点地址，低 5 位命令）。

use crate::ProtocolError;
use bilge::prelude::*;

/// 命令 ID 位宽
pub const CMD_ID_BITS: u32 = 5;

/// 命令 ID 掩码（低 5 位）
pub const CMD_ID_MASK: u32 = 0x1F;

/// 标准帧下可用的最大节点地址（2^(11-5) - 1）
pub const MAX_NODE_ID: u8 = 0x3F;

// ============================================================================
// 命令 ID 常量（本 crate 实现的子集）
// ============================================================================

/// 请求轴状态
pub const SET_AXIS_STATE: u8 = 0x07;

/// 编码器估计值（位置/速度）
pub const GET_ENCODER_ESTIMATES: u8 = 0x09;

/// 设置控制模式与输入模式
pub const SET_CONTROLLER_MODE: u8 = 0x0B;

/// 位置设定值（含速度/力矩前馈）
pub const SET_INPUT_POS: u8 = 0x0C;

/// 速度设定值（含力矩前馈）
pub const SET_INPUT_VEL: u8 = 0x0D;

/// 力矩设定值
pub const SET_INPUT_TORQUE: u8 = 0x0E;

/// 清除错误
pub const CLEAR_ERRORS: u8 = 0x18;

/// 力矩目标值/估计值
pub const GET_TORQUES: u8 = 0x1C;

/// 11 位仲裁 ID 位域
///
/// bilge 按 LSB 优先排列字段：`cmd_id` 占 Bit 0-4，`node_id` 占 Bit 5-10。
#[bitsize(11)]
#[derive(FromBits, DebugBits, Clone, Copy, PartialEq, Eq)]
pub struct ArbitrationId {
    pub cmd_id: u5,
    pub node_id: u6,
}

impl ArbitrationId {
    /// 由节点地址和命令 ID 构建，节点地址超出 6 位时报错
    pub fn from_parts(node_id: u8, cmd_id: u8) -> Result<Self, ProtocolError> {
        if node_id > MAX_NODE_ID {
            return Err(ProtocolError::NodeIdOutOfRange {
                node_id: node_id as u32,
                max: MAX_NODE_ID as u32,
            });
        }
        Ok(Self::new(
            u5::new(cmd_id & CMD_ID_MASK as u8),
            u6::new(node_id),
        ))
    }

    /// 从原始 CAN ID 解析（只取低 11 位）
    pub fn from_raw(id: u32) -> Self {
        Self::from(u11::new((id & 0x7FF) as u16))
    }

    /// 转换为原始 CAN ID
    pub fn raw(self) -> u32 {
        u11::from(self).value() as u32
    }
}

/// 计算仲裁 ID：`node_id << 5 | cmd_id`
pub fn arbitration_id(node_id: u8, cmd_id: u8) -> Result<u32, ProtocolError> {
    ArbitrationId::from_parts(node_id, cmd_id).map(ArbitrationId::raw)
}

/// 从 CAN ID 取节点地址（高位）
pub fn node_id_of(id: u32) -> u32 {
    id >> CMD_ID_BITS
}

/// 从 CAN ID 取命令 ID（低 5 位）
pub fn cmd_id_of(id: u32) -> u8 {
    (id & CMD_ID_MASK) as u8
}
