//! 状态转换结果

use serde::{Deserialize, Serialize};

/// Outcome of handling one media-query change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// 查询开始匹配且 match 校验通过，进入状态
    Entered,
    /// 查询不再匹配，离开状态
    Left,
    /// 查询匹配但被 match 校验器否决，状态不变
    Vetoed,
    /// 状态无效，通知被忽略
    Ignored,
}

impl Transition {
    /// Whether the state-change notifier must be called.
    pub fn is_change(self) -> bool {
        matches!(self, Self::Entered | Self::Left)
    }

    /// 获取可读描述
    pub fn description(self) -> &'static str {
        match self {
            Self::Entered => "entered",
            Self::Left => "left",
            Self::Vetoed => "vetoed by match validators",
            Self::Ignored => "ignored (invalid state)",
        }
    }
}
