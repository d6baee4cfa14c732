//! # ODrive Protocol
//!
//! ODrive CAN Simple 协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `ids`: 命令 ID 常量与仲裁 ID 位布局
//! - `enums`: 轴状态、控制模式、输入模式
//! - `messages`: 各消息类型的编码/解码
//! - `inbound`: 入站帧的分类解析
//!
//! ## 字节序
//!
//! 协议使用小端字节序（Intel）。位置/速度字段的单位是圈（rev）和圈/秒（rev/s），
//! 力矩字段的单位是 N·m。本 crate 不做任何弧度或减速比换算。

pub mod enums;
pub mod ids;
pub mod inbound;
pub mod messages;

pub use enums::*;
pub use ids::*;
pub use inbound::InboundMessage;
pub use messages::*;

use thiserror::Error;

/// CAN 2.0 标准帧的统一抽象
///
/// 协议层与硬件层之间的中间类型：
/// - 协议层通过 [`CanMessage::to_frame`] 构建、[`InboundMessage::parse`] 解析
/// - CAN 层（`odrive-can`）负责与 SocketCAN 等后端互相转换
///
/// 固定 8 字节数据区，`Copy`，无堆分配。
///
/// ```rust
/// use odrive_protocol::OdriveFrame;
///
/// let frame = OdriveFrame::new(0x0A9, &[1, 2, 3, 4]);
/// assert_eq!(frame.id(), 0x0A9);
/// assert_eq!(frame.data_slice(), &[1, 2, 3, 4]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OdriveFrame {
    /// CAN ID（11 位标准帧）
    pub id: u32,

    /// 帧数据（固定 8 字节，未使用部分为 0）
    pub data: [u8; 8],

    /// 有效数据长度 (0-8)
    pub len: u8,

    /// 接收时间戳（微秒），0 表示不可用
    pub timestamp_us: u64,
}

impl OdriveFrame {
    /// 创建标准帧，超过 8 字节的数据会被截断
    pub fn new(id: u32, data: &[u8]) -> Self {
        let mut fixed_data = [0u8; 8];
        let len = data.len().min(8);
        fixed_data[..len].copy_from_slice(&data[..len]);

        Self {
            id,
            data: fixed_data,
            len: len as u8,
            timestamp_us: 0,
        }
    }

    /// 获取有效数据切片
    pub fn data_slice(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// 发送方节点地址（仲裁 ID 高位）
    pub fn node_id(&self) -> u32 {
        node_id_of(self.id)
    }

    /// 命令 ID（仲裁 ID 低 5 位）
    pub fn cmd_id(&self) -> u8 {
        cmd_id_of(self.id)
    }
}

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid frame length for command 0x{cmd_id:02X}: expected {expected}, got {actual}")]
    InvalidLength {
        cmd_id: u8,
        expected: usize,
        actual: usize,
    },

    #[error("Unexpected command ID: expected 0x{expected:02X}, got 0x{actual:02X}")]
    UnexpectedCommand { expected: u8, actual: u8 },

    #[error("Node ID {node_id} out of range (max {max})")]
    NodeIdOutOfRange { node_id: u32, max: u32 },

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: &'static str, value: u32 },
}

/// 小端字节序读取工具
///
/// 调用方保证 `data` 至少包含 `offset + N` 字节。
pub fn read_f32_le(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

pub fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

pub fn read_i16_le(data: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([data[offset], data[offset + 1]])
}

/// 定点缩放编码：`value / factor` 向零截断，超出范围时饱和
pub fn encode_scaled_i16(value: f32, factor: f32) -> i16 {
    (value / factor) as i16
}

/// 定点缩放解码：`raw * factor`
pub fn decode_scaled_i16(raw: i16, factor: f32) -> f32 {
    raw as f32 * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_new_truncates_to_8_bytes() {
        let frame = OdriveFrame::new(0x10, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(frame.len, 8);
        assert_eq!(frame.data_slice(), &[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_frame_short_payload_zero_padded() {
        let frame = OdriveFrame::new(0x10, &[0xAA]);
        assert_eq!(frame.len, 1);
        assert_eq!(frame.data, [0xAA, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_frame_address_split() {
        // node 5, cmd 0x09
        let frame = OdriveFrame::new(5 << 5 | 0x09, &[]);
        assert_eq!(frame.node_id(), 5);
        assert_eq!(frame.cmd_id(), 0x09);
    }

    #[test]
    fn test_read_le_helpers() {
        let bytes = 1.5f32.to_le_bytes();
        assert_eq!(read_f32_le(&bytes, 0), 1.5);

        let bytes = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u32_le(&bytes, 0), 0x12345678);

        let bytes = [0xFF, 0xFF];
        assert_eq!(read_i16_le(&bytes, 0), -1);
    }

    #[test]
    fn test_scaled_i16_truncates_and_saturates() {
        assert_eq!(encode_scaled_i16(1.2345, 0.001), 1234);
        assert_eq!(encode_scaled_i16(-1.2345, 0.001), -1234);
        assert_eq!(encode_scaled_i16(1000.0, 0.001), i16::MAX);
        assert_eq!(encode_scaled_i16(-1000.0, 0.001), i16::MIN);
        assert_eq!(encode_scaled_i16(f32::NAN, 0.001), 0);
        assert!((decode_scaled_i16(1234, 0.001) - 1.234).abs() < 1e-6);
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::InvalidLength {
            cmd_id: 0x09,
            expected: 8,
            actual: 4,
        };
        assert_eq!(
            err.to_string(),
            "Invalid frame length for command 0x09: expected 8, got 4"
        );
    }
}
