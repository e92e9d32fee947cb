use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ucme::types::UserProfile;

/// 候选人：服务端推荐接口按展示顺序返回的用户资料
///
/// 拉取后不再变化，浏览会话期间由 SwipeSession 独占，滑过即丢弃
pub type Candidate = UserProfile;

/// 滑动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// 右滑喜欢
    Like,
    /// 左滑跳过
    Pass,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeDirection::Like => "like",
            SwipeDirection::Pass => "pass",
        }
    }
}

/// 一次滑动决策
///
/// 构造、发送、丢弃，不落地。request_id 是每次决策的幂等随机数，
/// 作为请求的 operationID 头发出
#[derive(Debug, Clone)]
pub struct SwipeDecision {
    pub target_id: i64,
    pub direction: SwipeDirection,
    pub request_id: String,
}

impl SwipeDecision {
    pub fn new(target_id: i64, direction: SwipeDirection) -> Self {
        Self {
            target_id,
            direction,
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

/// 决策记录结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionOutcome {
    /// 服务端记录 ID
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "targetId", default)]
    pub target_id: i64,
    #[serde(rename = "isLike", default)]
    pub is_like: bool,
    /// 是否构成双向喜欢
    #[serde(rename = "isMatch", default)]
    pub is_match: bool,
    /// 匹配 ID（isMatch 为 true 时存在）
    #[serde(rename = "matchId", default)]
    pub match_id: Option<i64>,
}

/// 已有匹配列表条目
#[derive(Debug, Clone, Deserialize)]
pub struct MatchEntry {
    #[serde(rename = "matchId")]
    pub match_id: i64,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<NaiveDateTime>,
    /// 对方用户资料
    pub user: UserProfile,
}

/// 匹配事件
///
/// 仅在一次 like 决策的响应表明双向喜欢时产生；
/// 展示固定时长后自动消失，本端不持久化
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchEvent {
    /// 对方用户 ID
    pub with_user_id: i64,
    /// 对方显示名（用于横幅文案）
    pub with_user_name: String,
    /// 匹配 ID
    pub match_id: i64,
    /// 检测到匹配的时刻
    pub timestamp: DateTime<Utc>,
}

/// 浏览会话状态机
///
/// `Loading → Ready → (Deciding → Ready)* → Exhausted`，
/// `Loading`/`Deciding` 途中失败进入 `Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeSessionState {
    /// 尚未开始
    Idle,
    /// 正在拉取候选队列
    Loading,
    /// 可以滑动
    Ready,
    /// 一次决策在途，期间的重复滑动会被拒绝
    Deciding,
    /// 队列已滑完，只有 start()（刷新）能离开此状态
    Exhausted,
    /// 拉取或决策失败；retryable 表示是否值得重试
    Error { retryable: bool },
}
