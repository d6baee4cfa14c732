//! 内存模拟 CAN 总线
//!
//! 克隆出的句柄共享同一组队列：测试把一个句柄交给控制器，
//! 用另一个句柄注入入站帧、检查已发送的帧。

use crate::{CanAdapter, CanError, OdriveFrame};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockBus {
    /// 待接收队列（设备 -> 主机）
    rx_queue: VecDeque<OdriveFrame>,
    /// 已发送帧（主机 -> 设备）
    sent: Vec<OdriveFrame>,
    /// 为 true 时 send 返回错误（帧不记录）
    fail_sends: bool,
    /// 接收一次后返回的错误
    rx_error_once: bool,
}

/// MockCanAdapter 用于测试
#[derive(Debug, Clone, Default)]
pub struct MockCanAdapter {
    bus: Arc<Mutex<MockBus>>,
}

impl MockCanAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn bus(&self) -> MutexGuard<'_, MockBus> {
        // 测试代码中 panic 后锁被毒化也继续使用内部数据
        self.bus.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 注入一帧，等待下次读周期取出
    pub fn inject(&self, frame: OdriveFrame) {
        self.bus().rx_queue.push_back(frame);
    }

    /// 待接收帧数量
    pub fn pending(&self) -> usize {
        self.bus().rx_queue.len()
    }

    /// 已发送帧的快照
    pub fn sent_frames(&self) -> Vec<OdriveFrame> {
        self.bus().sent.clone()
    }

    /// 取出并清空已发送帧
    pub fn take_sent(&self) -> Vec<OdriveFrame> {
        std::mem::take(&mut self.bus().sent)
    }

    /// 让后续 send 全部失败
    pub fn set_fail_sends(&self, fail: bool) {
        self.bus().fail_sends = fail;
    }

    /// 下一次接收返回 `CanError::BusOff`
    pub fn fail_next_receive(&self) {
        self.bus().rx_error_once = true;
    }
}

impl CanAdapter for MockCanAdapter {
    fn send(&mut self, frame: OdriveFrame) -> Result<(), CanError> {
        let mut bus = self.bus();
        if bus.fail_sends {
            return Err(CanError::Io(std::io::Error::other("mock send failure")));
        }
        bus.sent.push(frame);
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<OdriveFrame>, CanError> {
        let mut bus = self.bus();
        if bus.rx_error_once {
            bus.rx_error_once = false;
            return Err(CanError::BusOff);
        }
        Ok(bus.rx_queue.pop_front())
    }
}
