use async_trait::async_trait;

use crate::ucme::discover::types::MatchEvent;
use crate::ucme::types::ApiError;

/// 浏览会话回调接口
#[async_trait]
pub trait DiscoverListener: Send + Sync {
    /// 候选队列加载完成
    async fn on_queue_loaded(&self, count: usize);

    /// 队列已滑完
    async fn on_queue_exhausted(&self);

    /// 某次决策记录失败（游标照常前进，不阻塞浏览）
    async fn on_decision_failed(&self, target_id: i64, error: ApiError);

    /// 检测到双向喜欢
    async fn on_match(&self, event: MatchEvent);

    /// 匹配横幅展示期满自动消失
    async fn on_match_dismissed(&self);
}

/// 空实现（默认监听器）
pub struct EmptyDiscoverListener;

#[async_trait]
impl DiscoverListener for EmptyDiscoverListener {
    async fn on_queue_loaded(&self, _count: usize) {}
    async fn on_queue_exhausted(&self) {}
    async fn on_decision_failed(&self, _target_id: i64, _error: ApiError) {}
    async fn on_match(&self, _event: MatchEvent) {}
    async fn on_match_dismissed(&self) {}
}
