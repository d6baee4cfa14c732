//! 出站命令类型
//!
//! 把六种下发消息收拢到一个和类型里，轴和控制器只处理 [`AxisMessage`]，
//! 编码细节留给协议层。

use odrive_protocol::{
    CanMessage, ClearErrors, OdriveFrame, ProtocolError, SetAxisState, SetControllerMode,
    SetInputPos, SetInputTorque, SetInputVel,
};
use smallvec::SmallVec;

/// 模式切换计划缓冲区
///
/// 一次切换最多 3 帧（控制模式、清除错误、闭环），栈上预留 3 个位置，不分配堆内存。
pub type MessageBuffer = SmallVec<[AxisMessage; 3]>;

/// 下发到单个轴的消息
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisMessage {
    SetAxisState(SetAxisState),
    SetControllerMode(SetControllerMode),
    SetInputPos(SetInputPos),
    SetInputVel(SetInputVel),
    SetInputTorque(SetInputTorque),
    ClearErrors(ClearErrors),
}

impl AxisMessage {
    /// 命令 ID（仲裁 ID 低 5 位）
    pub fn cmd_id(&self) -> u8 {
        match self {
            AxisMessage::SetAxisState(_) => SetAxisState::CMD_ID,
            AxisMessage::SetControllerMode(_) => SetControllerMode::CMD_ID,
            AxisMessage::SetInputPos(_) => SetInputPos::CMD_ID,
            AxisMessage::SetInputVel(_) => SetInputVel::CMD_ID,
            AxisMessage::SetInputTorque(_) => SetInputTorque::CMD_ID,
            AxisMessage::ClearErrors(_) => ClearErrors::CMD_ID,
        }
    }

    /// 构建发往 `node_id` 的帧
    pub fn to_frame(&self, node_id: u8) -> Result<OdriveFrame, ProtocolError> {
        match self {
            AxisMessage::SetAxisState(m) => m.to_frame(node_id),
            AxisMessage::SetControllerMode(m) => m.to_frame(node_id),
            AxisMessage::SetInputPos(m) => m.to_frame(node_id),
            AxisMessage::SetInputVel(m) => m.to_frame(node_id),
            AxisMessage::SetInputTorque(m) => m.to_frame(node_id),
            AxisMessage::ClearErrors(m) => m.to_frame(node_id),
        }
    }
}

impl From<SetAxisState> for AxisMessage {
    fn from(msg: SetAxisState) -> Self {
        AxisMessage::SetAxisState(msg)
    }
}

impl From<SetControllerMode> for AxisMessage {
    fn from(msg: SetControllerMode) -> Self {
        AxisMessage::SetControllerMode(msg)
    }
}

impl From<SetInputPos> for AxisMessage {
    fn from(msg: SetInputPos) -> Self {
        AxisMessage::SetInputPos(msg)
    }
}

impl From<SetInputVel> for AxisMessage {
    fn from(msg: SetInputVel) -> Self {
        AxisMessage::SetInputVel(msg)
    }
}

impl From<SetInputTorque> for AxisMessage {
    fn from(msg: SetInputTorque) -> Self {
        AxisMessage::SetInputTorque(msg)
    }
}

impl From<ClearErrors> for AxisMessage {
    fn from(msg: ClearErrors) -> Self {
        AxisMessage::ClearErrors(msg)
    }
}
