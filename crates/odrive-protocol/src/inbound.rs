//! 入站帧分类解析
//!
//! 把 "命令 ID -> 消息类型" 的分派集中到一个和类型里，驱动层用穷尽 `match` 处理。

use crate::messages::{CanMessage, GetEncoderEstimates, GetTorques, check_length};
use crate::{OdriveFrame, ProtocolError};

/// 设备上报的消息
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InboundMessage {
    /// 编码器估计值 (0x09)
    EncoderEstimates(GetEncoderEstimates),
    /// 力矩目标值/估计值 (0x1C)
    Torques(GetTorques),
    /// 本驱动不处理的命令 ID（心跳、错误上报等）
    Unknown { cmd_id: u8 },
}

impl InboundMessage {
    /// 按低 5 位命令 ID 解析
    ///
    /// # 错误
    /// - `ProtocolError::InvalidLength`: 已识别的命令但帧长度不足
    pub fn parse(frame: &OdriveFrame) -> Result<Self, ProtocolError> {
        match frame.cmd_id() {
            GetEncoderEstimates::CMD_ID => {
                check_length::<GetEncoderEstimates>(frame)?;
                Ok(Self::EncoderEstimates(GetEncoderEstimates::decode(
                    frame.data_slice(),
                )))
            },
            GetTorques::CMD_ID => {
                check_length::<GetTorques>(frame)?;
                Ok(Self::Torques(GetTorques::decode(frame.data_slice())))
            },
            cmd_id => Ok(Self::Unknown { cmd_id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimates_frame(node_id: u8, pos: f32, vel: f32) -> OdriveFrame {
        GetEncoderEstimates {
            pos_estimate: pos,
            vel_estimate: vel,
        }
        .to_frame(node_id)
        .unwrap()
    }

    #[test]
    fn test_parse_encoder_estimates() {
        let msg = InboundMessage::parse(&estimates_frame(1, 0.5, 2.0)).unwrap();
        assert_eq!(
            msg,
            InboundMessage::EncoderEstimates(GetEncoderEstimates {
                pos_estimate: 0.5,
                vel_estimate: 2.0
            })
        );
    }

    #[test]
    fn test_parse_torques() {
        let frame = GetTorques {
            torque_target: 1.0,
            torque_estimate: 0.9,
        }
        .to_frame(1)
        .unwrap();
        match InboundMessage::parse(&frame).unwrap() {
            InboundMessage::Torques(msg) => {
                assert_eq!(msg.torque_target, 1.0);
                assert_eq!(msg.torque_estimate, 0.9);
            },
            other => panic!("Expected Torques, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_truncated_frame() {
        let frame = OdriveFrame::new(1 << 5 | 0x09, &[0, 0, 0]);
        assert!(matches!(
            InboundMessage::parse(&frame),
            Err(ProtocolError::InvalidLength {
                expected: 8,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_unknown_command() {
        // 0x01 为心跳帧，本驱动不解析
        let frame = OdriveFrame::new(1 << 5 | 0x01, &[0; 8]);
        assert_eq!(
            InboundMessage::parse(&frame).unwrap(),
            InboundMessage::Unknown { cmd_id: 0x01 }
        );

        // 未知命令即使长度为 0 也不报错
        let frame = OdriveFrame::new(1 << 5 | 0x1F, &[]);
        assert_eq!(
            InboundMessage::parse(&frame).unwrap(),
            InboundMessage::Unknown { cmd_id: 0x1F }
        );
    }
}
