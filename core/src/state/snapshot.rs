//! 管理器快照

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::StateSnapshot;

/// Point-in-time report of every state owned by a manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    /// 快照 ID
    pub snapshot_id: String,
    /// 快照时间
    pub timestamp: DateTime<Utc>,
    /// 所有状态，按添加顺序
    pub states: Vec<StateSnapshot>,
    /// 已注册的校验器名称
    pub validators: Vec<String>,
    /// 快照版本
    pub version: String,
}

impl ManagerSnapshot {
    pub fn new(states: Vec<StateSnapshot>, validators: Vec<String>) -> Self {
        Self {
            snapshot_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            states,
            validators,
            version: "1.0.0".to_string(),
        }
    }

    pub fn active_ids(&self) -> Vec<&str> {
        self.states
            .iter()
            .filter(|s| s.active)
            .map(|s| s.id.as_str())
            .collect()
    }

    /// 序列化为 JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize snapshot")
    }

    /// 从 JSON 反序列化
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize snapshot")
    }
}
