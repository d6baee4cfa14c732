//! 单轴状态与换算
//!
//! `Axis` 负责三件事：
//! - 把关节空间的命令（rad / rad/s / N·m）换算成设备设定值消息
//! - 解析设备上报的帧，保存设备侧原始估计值
//! - 给出模式切换需要下发的消息序列
//!
//! ## 方向与减速比
//!
//! `direction_factor = -gear_ratio`（未反转）或 `+gear_ratio`（反转）。
//!
//! - 上行：关节值 = 设备值 × direction_factor（位置、速度先乘 2π 转成弧度）
//! - 下行：设备值 = 关节值 / direction_factor（位置、速度再除以 2π 转成圈）
//!
//! 设备侧原始值与关节空间状态分开保存，每个读周期由 [`Axis::apply_transmission`]
//! 从原始值重新计算一次。

use crate::channels::{EnabledChannels, InterfaceKind, SelectedChannel};
use crate::command::{AxisMessage, MessageBuffer};
use crate::config::AxisConfig;
use odrive_can::CanAdapter;
use odrive_protocol::{
    ClearErrors, InboundMessage, OdriveFrame, ProtocolError, SetAxisState, SetControllerMode,
    SetInputPos, SetInputTorque, SetInputVel,
};
use std::f64::consts::TAU;
use tracing::{debug, trace, warn};

/// 关节空间命令（由上层在两次写周期之间修改）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisCommand {
    /// 位置设定值 [rad]
    pub position: f64,
    /// 速度设定值 [rad/s]
    pub velocity: f64,
    /// 力矩设定值 [N·m]
    pub torque: f64,
}

/// 关节空间状态（只由读周期写入）
///
/// 收到设备数据之前所有字段为 NaN。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisState {
    /// 位置估计 [rad]
    pub position: f64,
    /// 速度估计 [rad/s]
    pub velocity: f64,
    /// 设备力矩目标 [N·m]（不做方向/减速比换算）
    pub torque_target: f64,
    /// 力矩估计 [N·m]
    pub torque_estimate: f64,
}

impl AxisState {
    pub const UNKNOWN: Self = Self {
        position: f64::NAN,
        velocity: f64::NAN,
        torque_target: f64::NAN,
        torque_estimate: f64::NAN,
    };
}

impl Default for AxisState {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

/// 设备侧最近一次上报的值（电机方向，未乘减速比）
#[derive(Debug, Clone, Copy)]
struct RawEstimates {
    /// [rad]
    position: f64,
    /// [rad/s]
    velocity: f64,
    torque_target: f64,
    torque_estimate: f64,
}

impl Default for RawEstimates {
    fn default() -> Self {
        Self {
            position: f64::NAN,
            velocity: f64::NAN,
            torque_target: f64::NAN,
            torque_estimate: f64::NAN,
        }
    }
}

/// 单个 ODrive 轴
#[derive(Debug, Clone)]
pub struct Axis {
    config: AxisConfig,
    /// 关节空间命令，上层直接读写
    pub command: AxisCommand,
    state: AxisState,
    raw: RawEstimates,
    channels: EnabledChannels,
}

impl Axis {
    pub fn new(config: AxisConfig) -> Self {
        Self {
            config,
            command: AxisCommand::default(),
            state: AxisState::UNKNOWN,
            raw: RawEstimates::default(),
            channels: EnabledChannels::NONE,
        }
    }

    pub fn config(&self) -> &AxisConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn node_id(&self) -> u8 {
        self.config.node_id
    }

    pub fn state(&self) -> &AxisState {
        &self.state
    }

    pub fn channels(&self) -> EnabledChannels {
        self.channels
    }

    /// 状态接口绑定的值
    ///
    /// `effort` 对应设备力矩目标（`torque_target`），不是力矩估计。
    pub fn state_value(&self, kind: InterfaceKind) -> f64 {
        match kind {
            InterfaceKind::Effort => self.state.torque_target,
            InterfaceKind::Velocity => self.state.velocity,
            InterfaceKind::Position => self.state.position,
        }
    }

    /// 命令接口绑定的设定值
    pub fn command_value_mut(&mut self, kind: InterfaceKind) -> &mut f64 {
        match kind {
            InterfaceKind::Effort => &mut self.command.torque,
            InterfaceKind::Velocity => &mut self.command.velocity,
            InterfaceKind::Position => &mut self.command.position,
        }
    }

    /// 是否已收到位置估计
    pub fn has_position_estimate(&self) -> bool {
        self.state.position.is_finite()
    }

    /// 只修改通道标志，不触发模式切换（由控制器负责）
    pub(crate) fn channels_mut(&mut self) -> &mut EnabledChannels {
        &mut self.channels
    }

    /// 关节侧到电机侧的带符号系数
    pub fn direction_factor(&self) -> f64 {
        if self.config.reversed {
            self.config.gear_ratio
        } else {
            -self.config.gear_ratio
        }
    }

    // ============================================================
    // 上行：设备 -> 关节
    // ============================================================

    /// 处理一帧发给本轴的数据
    ///
    /// 返回 `true` 表示原始估计值被更新。截断的帧记录警告后丢弃，未知命令静默忽略。
    pub fn on_can_msg(&mut self, frame: &OdriveFrame) -> bool {
        match InboundMessage::parse(frame) {
            Ok(InboundMessage::EncoderEstimates(msg)) => {
                self.raw.position = msg.pos_estimate as f64 * TAU;
                self.raw.velocity = msg.vel_estimate as f64 * TAU;
                trace!(
                    "Axis '{}': encoder estimates pos={} rev vel={} rev/s",
                    self.config.name, msg.pos_estimate, msg.vel_estimate
                );
                true
            },
            Ok(InboundMessage::Torques(msg)) => {
                self.raw.torque_target = msg.torque_target as f64;
                self.raw.torque_estimate = msg.torque_estimate as f64;
                trace!(
                    "Axis '{}': torques target={} estimate={}",
                    self.config.name, msg.torque_target, msg.torque_estimate
                );
                true
            },
            Ok(InboundMessage::Unknown { .. }) => false,
            Err(ProtocolError::InvalidLength { cmd_id, .. }) => {
                warn!("message {} too short", cmd_id);
                false
            },
            Err(e) => {
                warn!("Axis '{}': failed to parse frame 0x{:X}: {}", self.config.name, frame.id, e);
                false
            },
        }
    }

    /// 由原始估计值重新计算关节空间状态
    ///
    /// 幂等：没有新帧时重复调用结果不变。
    pub fn apply_transmission(&mut self) {
        let factor = self.direction_factor();
        self.state = AxisState {
            position: self.raw.position * factor,
            velocity: self.raw.velocity * factor,
            torque_target: self.raw.torque_target,
            torque_estimate: self.raw.torque_estimate * factor,
        };
    }

    // ============================================================
    // 下行：关节 -> 设备
    // ============================================================

    /// 按当前通道标志和当前命令生成设定值消息
    ///
    /// 优先级 位置 > 速度 > 力矩；非主通道已使能时作为前馈项，否则为 0。
    /// 没有通道使能时返回 `None`（设备保持上一条命令）。
    pub fn setpoint_message(&self) -> Option<AxisMessage> {
        let factor = self.direction_factor();
        let channels = self.channels;

        let vel_ff = if channels.velocity {
            self.command.velocity / (TAU * factor)
        } else {
            0.0
        };
        let torque_ff = if channels.torque {
            self.command.torque / factor
        } else {
            0.0
        };

        match channels.select() {
            SelectedChannel::Position => Some(AxisMessage::SetInputPos(SetInputPos {
                input_pos: (self.command.position / (TAU * factor)) as f32,
                vel_ff: vel_ff as f32,
                torque_ff: torque_ff as f32,
            })),
            SelectedChannel::Velocity => Some(AxisMessage::SetInputVel(SetInputVel {
                input_vel: vel_ff as f32,
                input_torque_ff: torque_ff as f32,
            })),
            SelectedChannel::Torque => Some(AxisMessage::SetInputTorque(SetInputTorque {
                input_torque: torque_ff as f32,
            })),
            SelectedChannel::None => None,
        }
    }

    /// 模式切换要下发的消息序列（不修改状态）
    ///
    /// - 未激活或无通道：`SetAxisState(Idle)`
    /// - 否则：`SetControllerMode(mode, Passthrough)`、`ClearErrors(0)`、
    ///   `SetAxisState(ClosedLoopControl)`，按此顺序
    pub fn mode_switch_messages(&self, active: bool) -> MessageBuffer {
        let mut plan = MessageBuffer::new();
        let mode = if active {
            self.channels.select().control_mode()
        } else {
            None
        };

        match mode {
            Some(mode) => {
                plan.push(SetControllerMode::passthrough(mode).into());
                plan.push(ClearErrors { identify: 0 }.into());
                plan.push(SetAxisState::closed_loop_control().into());
            },
            None => plan.push(SetAxisState::idle().into()),
        }
        plan
    }

    /// 进入位置模式前，用当前位置估计作为位置设定值，清零速度和力矩命令
    pub fn seed_position_setpoint(&mut self) {
        if self.state.position.is_nan() {
            warn!(
                "Axis '{}': no position estimate yet, position setpoint seeded with NaN",
                self.config.name
            );
        }
        self.command.position = self.state.position;
        self.command.velocity = 0.0;
        self.command.torque = 0.0;
    }

    /// 准备一次模式切换：必要时先写入位置种子，再返回消息序列
    pub fn prepare_mode_switch(&mut self, active: bool) -> MessageBuffer {
        let selected = self.channels.select();
        if active && selected == SelectedChannel::Position {
            self.seed_position_setpoint();
        }
        debug!(
            "Axis '{}': mode switch (active={}, channel={:?})",
            self.config.name, active, selected
        );
        self.mode_switch_messages(active)
    }

    /// 编码并发送一条消息
    ///
    /// 发送失败只记录警告，不向上返回（下一周期重新生成）。返回是否发送成功。
    pub fn send<A: CanAdapter + ?Sized>(&self, msg: &AxisMessage, can: &mut A) -> bool {
        let frame = match msg.to_frame(self.config.node_id) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Axis '{}': failed to encode message: {}", self.config.name, e);
                return false;
            },
        };

        match can.send(frame) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Axis '{}': failed to send frame 0x{:X}: {}",
                    self.config.name, frame.id, e
                );
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odrive_can::MockCanAdapter;
    use odrive_protocol::{
        AxisRequestedState, CanMessage, ControlMode, GET_ENCODER_ESTIMATES, GetEncoderEstimates,
        GetTorques, SET_INPUT_POS,
    };
    use std::f64::consts::PI;

    fn axis(node_id: u8, gear_ratio: f64, reversed: bool) -> Axis {
        Axis::new(
            AxisConfig::new("joint", node_id)
                .with_gear_ratio(gear_ratio)
                .with_reversed(reversed),
        )
    }

    fn estimates(node_id: u8, pos: f32, vel: f32) -> OdriveFrame {
        GetEncoderEstimates {
            pos_estimate: pos,
            vel_estimate: vel,
        }
        .to_frame(node_id)
        .unwrap()
    }

    #[test]
    fn test_direction_factor() {
        assert_eq!(axis(0, 2.0, false).direction_factor(), -2.0);
        assert_eq!(axis(0, 2.0, true).direction_factor(), 2.0);
    }

    #[test]
    fn test_position_setpoint_scenario() {
        let mut axis = axis(5, 2.0, false);
        axis.channels_mut().position = true;
        axis.command.position = PI;

        match axis.setpoint_message() {
            Some(AxisMessage::SetInputPos(msg)) => {
                assert_eq!(msg.input_pos, -0.25);
                assert_eq!(msg.vel_ff, 0.0);
                assert_eq!(msg.torque_ff, 0.0);
            },
            other => panic!("Expected SetInputPos, got {:?}", other),
        }

        let frame = axis.setpoint_message().unwrap().to_frame(5).unwrap();
        assert_eq!(frame.id, 0xAC);
        assert_eq!(&frame.data[0..4], &(-0.25f32).to_le_bytes());
    }

    #[test]
    fn test_position_feedforward_terms() {
        let mut axis = axis(1, 1.0, true);
        axis.channels_mut().position = true;
        axis.channels_mut().velocity = true;
        axis.channels_mut().torque = true;
        axis.command.position = PI;
        axis.command.velocity = TAU;
        axis.command.torque = 0.5;

        match axis.setpoint_message() {
            Some(AxisMessage::SetInputPos(msg)) => {
                assert_eq!(msg.input_pos, 0.5);
                assert_eq!(msg.vel_ff, 1.0);
                assert_eq!(msg.torque_ff, 0.5);
            },
            other => panic!("Expected SetInputPos, got {:?}", other),
        }
    }

    #[test]
    fn test_velocity_setpoint_with_torque_feedforward() {
        let mut axis = axis(1, 2.0, false);
        axis.channels_mut().velocity = true;
        axis.channels_mut().torque = true;
        axis.command.velocity = 2.0 * TAU;
        axis.command.torque = 3.0;

        match axis.setpoint_message() {
            Some(AxisMessage::SetInputVel(msg)) => {
                assert_eq!(msg.input_vel, -1.0);
                assert_eq!(msg.input_torque_ff, -1.5);
            },
            other => panic!("Expected SetInputVel, got {:?}", other),
        }
    }

    #[test]
    fn test_torque_setpoint() {
        let mut axis = axis(1, 4.0, true);
        axis.channels_mut().torque = true;
        axis.command.torque = 2.0;
        axis.command.position = 100.0;

        assert_eq!(
            axis.setpoint_message(),
            Some(AxisMessage::SetInputTorque(SetInputTorque { input_torque: 0.5 }))
        );
    }

    #[test]
    fn test_no_channel_no_setpoint() {
        let mut axis = axis(1, 1.0, false);
        axis.command.position = 1.0;
        assert_eq!(axis.setpoint_message(), None);
    }

    #[test]
    fn test_encoder_estimates_scenario() {
        let mut axis = axis(2, 3.0, false);
        assert!(axis.on_can_msg(&estimates(2, 0.5, 0.0)));
        axis.apply_transmission();

        assert!((axis.state().position - (-3.0 * PI)).abs() < 1e-9);
        assert_eq!(axis.state().velocity, 0.0);
        assert!(axis.state().torque_estimate.is_nan());
    }

    #[test]
    fn test_transmission_does_not_compound() {
        let mut axis = axis(2, 3.0, true);
        axis.on_can_msg(&estimates(2, 1.0, 0.5));
        axis.apply_transmission();
        let first = *axis.state();
        axis.apply_transmission();
        axis.apply_transmission();
        assert_eq!(axis.state().position, first.position);
        assert_eq!(axis.state().velocity, first.velocity);
        assert!((first.position - 3.0 * TAU).abs() < 1e-9);
        assert!((first.velocity - 1.5 * TAU).abs() < 1e-9);
    }

    #[test]
    fn test_torques_message() {
        let mut axis = axis(3, 2.0, false);
        let frame = GetTorques {
            torque_target: 1.5,
            torque_estimate: 0.25,
        }
        .to_frame(3)
        .unwrap();
        assert!(axis.on_can_msg(&frame));
        axis.apply_transmission();

        assert_eq!(axis.state().torque_target, 1.5);
        assert_eq!(axis.state().torque_estimate, -0.5);
        assert!(axis.state().position.is_nan());
    }

    #[test]
    fn test_truncated_frame_does_not_mutate() {
        let mut axis = axis(2, 1.0, false);
        let id = (2 << 5) | GET_ENCODER_ESTIMATES as u32;
        assert!(!axis.on_can_msg(&OdriveFrame::new(id, &[0, 0, 0, 63])));
        axis.apply_transmission();
        assert!(axis.state().position.is_nan());
        assert!(axis.state().velocity.is_nan());
    }

    #[test]
    fn test_unknown_command_ignored() {
        let mut axis = axis(2, 1.0, false);
        // 0x01 = 心跳
        assert!(!axis.on_can_msg(&OdriveFrame::new((2 << 5) | 0x01, &[0; 8])));
        axis.apply_transmission();
        assert!(axis.state().position.is_nan());
    }

    #[test]
    fn test_mode_switch_plan_inactive_is_idle() {
        let mut axis = axis(1, 1.0, false);
        axis.channels_mut().position = true;
        let plan = axis.mode_switch_messages(false);
        assert_eq!(plan.as_slice(), &[AxisMessage::SetAxisState(SetAxisState::idle())]);
    }

    #[test]
    fn test_mode_switch_plan_active_no_channel_is_idle() {
        let axis = axis(1, 1.0, false);
        let plan = axis.mode_switch_messages(true);
        assert_eq!(plan.len(), 1);
        match plan[0] {
            AxisMessage::SetAxisState(msg) => {
                assert_eq!(msg.requested_state().unwrap(), AxisRequestedState::Idle)
            },
            other => panic!("Expected SetAxisState, got {:?}", other),
        }
    }

    #[test]
    fn test_mode_switch_plan_order() {
        let cases = [
            (EnabledChannels::position_only(), ControlMode::Position),
            (EnabledChannels::new(false, true, true), ControlMode::Velocity),
            (EnabledChannels::torque_only(), ControlMode::Torque),
        ];

        for (channels, mode) in cases {
            let mut axis = axis(1, 1.0, false);
            *axis.channels_mut() = channels;
            let plan = axis.mode_switch_messages(true);
            assert_eq!(
                plan.as_slice(),
                &[
                    AxisMessage::SetControllerMode(SetControllerMode::passthrough(mode)),
                    AxisMessage::ClearErrors(ClearErrors { identify: 0 }),
                    AxisMessage::SetAxisState(SetAxisState::closed_loop_control()),
                ],
                "channels = {:?}",
                channels
            );
        }
    }

    #[test]
    fn test_prepare_mode_switch_seeds_position() {
        let mut axis = axis(4, 2.0, true);
        axis.on_can_msg(&estimates(4, 0.25, 1.0));
        axis.apply_transmission();
        axis.command = AxisCommand {
            position: 9.0,
            velocity: 9.0,
            torque: 9.0,
        };
        *axis.channels_mut() = EnabledChannels::position_only();

        let plan = axis.prepare_mode_switch(true);
        assert_eq!(plan.len(), 3);
        assert!((axis.command.position - PI).abs() < 1e-9);
        assert_eq!(axis.command.velocity, 0.0);
        assert_eq!(axis.command.torque, 0.0);
    }

    #[test]
    fn test_prepare_mode_switch_velocity_keeps_command() {
        let mut axis = axis(4, 1.0, false);
        axis.command.position = 7.0;
        *axis.channels_mut() = EnabledChannels::velocity_only();
        axis.prepare_mode_switch(true);
        assert_eq!(axis.command.position, 7.0);
    }

    #[test]
    fn test_send_logs_and_swallows_failures() {
        let handle = MockCanAdapter::new();
        let mut can = handle.clone();
        let mut axis = axis(5, 2.0, false);
        axis.channels_mut().position = true;
        let msg = axis.setpoint_message().unwrap();

        assert!(axis.send(&msg, &mut can));
        let sent = handle.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].cmd_id(), SET_INPUT_POS);
        assert_eq!(sent[0].node_id(), 5);

        handle.set_fail_sends(true);
        assert!(!axis.send(&msg, &mut can));
        assert!(handle.sent_frames().is_empty());
    }

    #[test]
    fn test_effort_state_interface_reads_torque_target() {
        let mut axis = axis(6, 2.0, false);
        let frame = GetTorques {
            torque_target: 1.5,
            torque_estimate: 0.5,
        }
        .to_frame(6)
        .unwrap();
        assert!(axis.on_can_msg(&frame));
        axis.apply_transmission();

        assert_eq!(axis.state_value(InterfaceKind::Effort), 1.5);
        assert_eq!(axis.state().torque_estimate, -1.0);
        assert!(axis.state_value(InterfaceKind::Position).is_nan());
        assert!(!axis.has_position_estimate());
    }

    #[test]
    fn test_command_interfaces_bind_setpoints() {
        let mut axis = axis(7, 1.0, false);
        *axis.command_value_mut(InterfaceKind::Effort) = 0.3;
        *axis.command_value_mut(InterfaceKind::Velocity) = -2.0;
        *axis.command_value_mut(InterfaceKind::Position) = 1.25;
        assert_eq!(
            axis.command,
            AxisCommand {
                position: 1.25,
                velocity: -2.0,
                torque: 0.3,
            }
        );
    }
}
