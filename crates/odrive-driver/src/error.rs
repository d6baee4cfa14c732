//! 驱动层错误类型定义

use crate::config::ConfigError;
use odrive_can::CanError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// CAN 适配层错误（打开接口失败等）
    #[error("CAN driver error: {0}")]
    Can(#[from] CanError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 生命周期顺序错误：尚未配置传输
    #[error("Hardware interface is not configured")]
    NotConfigured,

    /// 轴索引越界
    #[error("Axis index {index} out of range ({count} axes)")]
    AxisOutOfRange { index: usize, count: usize },
}
