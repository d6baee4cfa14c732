//! # ODrive CAN Adapter Layer
//!
//! CAN 硬件抽象层，提供统一的收发接口。
//!
//! - Linux: [`SocketCanAdapter`]（内核 SocketCAN）
//! - 测试: [`MockCanAdapter`]（`mock` feature，内存队列）

use thiserror::Error;

pub use odrive_protocol::OdriveFrame;

#[cfg(target_os = "linux")]
pub mod socketcan;

#[cfg(target_os = "linux")]
pub use socketcan::SocketCanAdapter;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockCanAdapter;

/// CAN 适配层统一错误类型
#[derive(Error, Debug)]
pub enum CanError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] CanDeviceError),
    #[error("Bus off")]
    BusOff,
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanDeviceErrorKind {
    NotFound,
    NotUp,
    InvalidFrame,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct CanDeviceError {
    pub kind: CanDeviceErrorKind,
    pub message: String,
}

impl CanDeviceError {
    pub fn new(kind: CanDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// CAN 收发接口
///
/// 控制器独占持有一个适配器，每次发送都是完整的一帧；
/// 读周期通过 [`CanAdapter::try_receive`] 非阻塞地逐帧取出待处理帧。
pub trait CanAdapter {
    /// 发送帧（Fire-and-Forget）
    fn send(&mut self, frame: OdriveFrame) -> Result<(), CanError>;

    /// 非阻塞接收：没有待处理帧时返回 `Ok(None)`
    fn try_receive(&mut self) -> Result<Option<OdriveFrame>, CanError>;
}

impl<A: CanAdapter + ?Sized> CanAdapter for Box<A> {
    fn send(&mut self, frame: OdriveFrame) -> Result<(), CanError> {
        (**self).send(frame)
    }

    fn try_receive(&mut self) -> Result<Option<OdriveFrame>, CanError> {
        (**self).try_receive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// 回环适配器：发送的帧进入接收队列
    struct LoopbackAdapter {
        queue: VecDeque<OdriveFrame>,
    }

    impl CanAdapter for LoopbackAdapter {
        fn send(&mut self, frame: OdriveFrame) -> Result<(), CanError> {
            self.queue.push_back(frame);
            Ok(())
        }

        fn try_receive(&mut self) -> Result<Option<OdriveFrame>, CanError> {
            Ok(self.queue.pop_front())
        }
    }

    #[test]
    fn test_boxed_adapter_forwards() {
        let mut adapter: Box<dyn CanAdapter> = Box::new(LoopbackAdapter {
            queue: VecDeque::new(),
        });
        assert!(adapter.try_receive().unwrap().is_none());
        adapter.send(OdriveFrame::new(0x2A, &[])).unwrap();
        assert_eq!(adapter.try_receive().unwrap().unwrap().id, 0x2A);
        assert!(adapter.try_receive().unwrap().is_none());
    }

    #[test]
    fn test_device_error_display() {
        let err = CanError::Device(CanDeviceError::new(CanDeviceErrorKind::NotUp, "can0 down"));
        assert_eq!(err.to_string(), "Device Error: NotUp: can0 down");
    }
}
