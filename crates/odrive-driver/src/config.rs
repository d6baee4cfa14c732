//! 系统配置
//!
//! 从 TOML 读取 CAN 接口名称和轴列表：
//!
//! ```toml
//! can = "can0"
//!
//! [[axes]]
//! name = "left_wheel"
//! node_id = 0
//! gear_ratio = 1.0
//! reversed = false
//! ```
//!
//! `transmission_ratio` / `reverse_axis` 作为别名接受。
//! 所有校验都在构造任何轴之前完成，失败即返回 [`ConfigError`]。

use odrive_protocol::MAX_NODE_ID;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("CAN interface name must not be empty")]
    EmptyInterface,

    #[error("Axis '{name}': gear ratio must be positive and finite, got {value}")]
    InvalidGearRatio { name: String, value: f64 },

    #[error("Axis '{name}': node id {node_id} out of range (max {max})")]
    NodeIdOutOfRange { name: String, node_id: u8, max: u8 },

    #[error("Duplicate node id {node_id} (axes '{first}' and '{second}')")]
    DuplicateNodeId {
        node_id: u8,
        first: String,
        second: String,
    },

    #[error("Duplicate joint name '{0}'")]
    DuplicateName(String),
}

fn default_gear_ratio() -> f64 {
    1.0
}

/// 单轴配置（创建后不再修改）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// 关节名称，用于构造接口名 `"<name>/position"` 等；为空时取 `axis<序号>`
    #[serde(default)]
    pub name: String,

    /// 设备节点地址（同一总线上唯一）
    pub node_id: u8,

    /// 减速比（关节侧 / 电机侧）
    #[serde(default = "default_gear_ratio", alias = "transmission_ratio")]
    pub gear_ratio: f64,

    /// 轴方向反转标志
    #[serde(default, alias = "reverse_axis")]
    pub reversed: bool,
}

impl AxisConfig {
    pub fn new(name: impl Into<String>, node_id: u8) -> Self {
        Self {
            name: name.into(),
            node_id,
            gear_ratio: default_gear_ratio(),
            reversed: false,
        }
    }

    pub fn with_gear_ratio(mut self, gear_ratio: f64) -> Self {
        self.gear_ratio = gear_ratio;
        self
    }

    pub fn with_reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }
}

/// 整个硬件系统的配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// CAN 接口名称（如 "can0"）
    pub can: String,

    #[serde(default)]
    pub axes: Vec<AxisConfig>,
}

impl SystemConfig {
    /// 解析并校验 TOML 文本
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SystemConfig = toml::from_str(text)?;
        config.validated()
    }

    /// 读取并校验 TOML 文件
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// 校验并补全默认关节名
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.can.trim().is_empty() {
            return Err(ConfigError::EmptyInterface);
        }
        self.axes = validate_axes(self.axes)?;
        Ok(self)
    }
}

/// 校验轴列表：减速比为正且有限、节点地址在 6 位范围内且不重复、关节名不重复
///
/// 空的关节名补全为 `axis<序号>`。
pub fn validate_axes(mut axes: Vec<AxisConfig>) -> Result<Vec<AxisConfig>, ConfigError> {
    for (index, axis) in axes.iter_mut().enumerate() {
        if axis.name.trim().is_empty() {
            axis.name = format!("axis{}", index);
        }
    }

    let mut by_node: HashMap<u8, &str> = HashMap::new();
    let mut names: HashMap<&str, ()> = HashMap::new();

    for axis in &axes {
        if !(axis.gear_ratio.is_finite() && axis.gear_ratio > 0.0) {
            return Err(ConfigError::InvalidGearRatio {
                name: axis.name.clone(),
                value: axis.gear_ratio,
            });
        }

        if axis.node_id > MAX_NODE_ID {
            return Err(ConfigError::NodeIdOutOfRange {
                name: axis.name.clone(),
                node_id: axis.node_id,
                max: MAX_NODE_ID,
            });
        }

        if let Some(first) = by_node.insert(axis.node_id, &axis.name) {
            return Err(ConfigError::DuplicateNodeId {
                node_id: axis.node_id,
                first: first.to_string(),
                second: axis.name.clone(),
            });
        }

        if names.insert(&axis.name, ()).is_some() {
            return Err(ConfigError::DuplicateName(axis.name.clone()));
        }
    }

    Ok(axes)
}
