//! 状态类型定义

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serializable point-in-time view of one media state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub id: String,
    pub query: String,
    pub valid: bool,
    pub active: bool,
    pub on_enter: usize,
    pub on_leave: usize,
    pub on_resize: usize,
    /// First-run callbacks still waiting for the first enter.
    pub first_run_pending: usize,
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

/// 状态事件
#[derive(Debug, Clone, Serialize)]
pub enum StateEvent {
    /// 状态已添加
    StateAdded {
        state_id: String,
        query: String,
        active: bool,
        timestamp: DateTime<Utc>,
    },
    /// 状态被 once 校验器拒绝
    StateRejected {
        state_id: String,
        timestamp: DateTime<Utc>,
    },
    /// 状态已移除
    StateRemoved {
        state_id: String,
        timestamp: DateTime<Utc>,
    },
    /// 某个状态发生了进入/离开转换
    StateChanged { timestamp: DateTime<Utc> },
    /// 视口尺寸变化已分发给所有状态
    Resized {
        state_count: usize,
        fired: usize,
        timestamp: DateTime<Utc>,
    },
}

impl StateEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::StateAdded { timestamp, .. } => *timestamp,
            Self::StateRejected { timestamp, .. } => *timestamp,
            Self::StateRemoved { timestamp, .. } => *timestamp,
            Self::StateChanged { timestamp } => *timestamp,
            Self::Resized { timestamp, .. } => *timestamp,
        }
    }

    pub fn state_id(&self) -> Option<&str> {
        match self {
            Self::StateAdded { state_id, .. }
            | Self::StateRejected { state_id, .. }
            | Self::StateRemoved { state_id, .. } => Some(state_id),
            _ => None,
        }
    }
}
