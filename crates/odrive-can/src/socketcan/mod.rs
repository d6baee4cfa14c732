//! SocketCAN CAN 适配器实现
//!
//! 基于 Linux SocketCAN 子系统。
//!
//! ## 限制
//!
//! - **仅限 Linux 平台**
//! - **接口配置**：波特率等由系统工具（`ip link`）完成，不在应用层设置
//! - **非阻塞**：socket 以 `O_NONBLOCK` 打开，读周期用 `try_receive` 逐帧排空

use crate::{CanAdapter, CanDeviceError, CanDeviceErrorKind, CanError, OdriveFrame};
use socketcan::{CanFrame, CanSocket, EmbeddedFrame, Frame, Socket, StandardId};
use std::io::ErrorKind;
use tracing::{trace, warn};

mod interface_check;

use interface_check::check_interface_status;

/// SocketCAN 适配器
///
/// ```no_run
/// use odrive_can::{CanAdapter, OdriveFrame, SocketCanAdapter};
///
/// let mut adapter = SocketCanAdapter::new("can0").unwrap();
/// adapter.send(OdriveFrame::new(0x0A7, &[8, 0, 0, 0])).unwrap();
/// while let Some(frame) = adapter.try_receive().unwrap() {
///     println!("0x{:X}", frame.id);
/// }
/// ```
#[derive(Debug)]
pub struct SocketCanAdapter {
    socket: CanSocket,
    /// 接口名称（如 "can0"）
    interface: String,
}

impl SocketCanAdapter {
    /// 打开 CAN 接口
    ///
    /// 打开前检查接口是否存在且处于 UP 状态。
    ///
    /// # 错误
    /// - `CanError::Device`（`NotFound` / `NotUp`）: 接口不存在或未启动
    /// - `CanError::Io`: 打开 socket 或设置非阻塞失败
    pub fn new(interface: impl Into<String>) -> Result<Self, CanError> {
        let interface = interface.into();

        if !check_interface_status(&interface)? {
            return Err(CanError::Device(CanDeviceError::new(
                CanDeviceErrorKind::NotUp,
                format!(
                    "CAN interface '{}' exists but is not UP. Please start it first:\n  sudo ip link set up {}",
                    interface, interface
                ),
            )));
        }

        let socket = CanSocket::open(&interface).map_err(|e| {
            CanError::Device(CanDeviceError::new(
                CanDeviceErrorKind::Backend,
                format!("Failed to open CAN interface '{}': {}", interface, e),
            ))
        })?;
        socket.set_nonblocking(true)?;

        trace!("SocketCAN interface '{}' opened (non-blocking)", interface);

        Ok(Self { socket, interface })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// 读取一帧；socket 为空时返回 `Ok(None)`，错误帧被记录并跳过
    fn read_data_frame(&mut self) -> Result<Option<OdriveFrame>, CanError> {
        loop {
            let can_frame = match self.socket.read_frame() {
                Ok(frame) => frame,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
                Err(e) => return Err(CanError::Io(e)),
            };

            match can_frame {
                CanFrame::Data(data_frame) => {
                    if data_frame.is_extended() {
                        trace!("Ignoring extended CAN frame 0x{:X}", data_frame.raw_id());
                        continue;
                    }
                    let frame = OdriveFrame::new(data_frame.raw_id(), data_frame.data());
                    trace!("Received CAN frame: ID=0x{:X}, len={}", frame.id, frame.len);
                    return Ok(Some(frame));
                },
                CanFrame::Remote(remote) => {
                    trace!("Ignoring remote CAN frame 0x{:X}", remote.raw_id());
                },
                CanFrame::Error(err) => {
                    warn!("CAN Error Frame received: 0x{:X}, ignoring", err.raw_id());
                },
            }
        }
    }
}

impl Drop for SocketCanAdapter {
    fn drop(&mut self) {
        trace!("[Auto-Drop] SocketCAN interface '{}' closed", self.interface);
    }
}

impl CanAdapter for SocketCanAdapter {
    /// 发送帧（Fire-and-Forget）
    ///
    /// # 错误
    /// - `CanError::Device`: ID 不是合法的 11 位标准 ID
    /// - `CanError::Io`: 发送失败（如发送缓冲区满）
    fn send(&mut self, frame: OdriveFrame) -> Result<(), CanError> {
        let can_frame = u16::try_from(frame.id)
            .ok()
            .and_then(StandardId::new)
            .and_then(|id| CanFrame::new(id, frame.data_slice()))
            .ok_or_else(|| {
                CanError::Device(CanDeviceError::new(
                    CanDeviceErrorKind::InvalidFrame,
                    format!("Failed to create standard frame with ID 0x{:X}", frame.id),
                ))
            })?;

        self.socket.write_frame(&can_frame)?;

        trace!("Sent CAN frame: ID=0x{:X}, len={}", frame.id, frame.len);
        Ok(())
    }

    /// 非阻塞接收（socket 以 `O_NONBLOCK` 打开，`WouldBlock` 即队列为空）
    fn try_receive(&mut self) -> Result<Option<OdriveFrame>, CanError> {
        self.read_data_frame()
    }
}
