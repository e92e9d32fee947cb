//! 浏览会话
//!
//! 持有一批有序候选人和一个游标，把方向输入变成一次已记录的决策并前进；
//! 决策响应表明双向喜欢时产生匹配事件。展示顺序严格等于服务端返回顺序，
//! 本端从不重排。

use chrono::Utc;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::ucme::discover::listener::DiscoverListener;
use crate::ucme::discover::notifier::MatchNotifier;
use crate::ucme::discover::types::{
    Candidate, MatchEvent, SwipeDecision, SwipeDirection, SwipeSessionState,
};
use crate::ucme::gateway::RemoteGateway;
use crate::ucme::types::ApiError;

struct SwipeInner {
    state: SwipeSessionState,
    queue: Vec<Candidate>,
    /// 队列内进度，单调不减；cursor >= queue.len() 即滑完
    cursor: usize,
}

/// 浏览会话
///
/// 锁只保护同步临界区，从不跨越挂起点持有；一次决策在途时
/// 状态停留在 `Deciding`，重复滑动（连点/按键重复）被直接拒绝而非排队
pub struct SwipeSession {
    gateway: Arc<dyn RemoteGateway>,
    listener: Arc<dyn DiscoverListener>,
    notifier: MatchNotifier,
    inner: Arc<Mutex<SwipeInner>>,
}

impl SwipeSession {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        notifier: MatchNotifier,
        listener: Arc<dyn DiscoverListener>,
    ) -> Self {
        Self {
            gateway,
            listener,
            notifier,
            inner: Arc::new(Mutex::new(SwipeInner {
                state: SwipeSessionState::Idle,
                queue: Vec::new(),
                cursor: 0,
            })),
        }
    }

    /// 开始或刷新浏览会话：拉取一批候选人，游标归零
    ///
    /// `Exhausted` / `Error` 状态下这是唯一的出路；
    /// `Loading` / `Deciding` 途中调用被拒绝
    pub async fn start(&self) -> Result<usize, ApiError> {
        {
            let mut inner = self.inner.lock().expect("swipe 锁中毒");
            match inner.state {
                SwipeSessionState::Loading => {
                    return Err(ApiError::InvalidState("候选队列正在加载".into()))
                }
                SwipeSessionState::Deciding => {
                    return Err(ApiError::InvalidState("上一次滑动尚未完成".into()))
                }
                _ => {}
            }
            inner.state = SwipeSessionState::Loading;
        }

        info!("[Swipe] 📡 开始加载候选队列");
        match self.gateway.fetch_candidates().await {
            Ok(list) => {
                let count = list.len();
                {
                    let mut inner = self.inner.lock().expect("swipe 锁中毒");
                    inner.queue = list;
                    inner.cursor = 0;
                    inner.state = if count == 0 {
                        SwipeSessionState::Exhausted
                    } else {
                        SwipeSessionState::Ready
                    };
                }
                info!("[Swipe] ✅ 候选队列就绪，共 {} 人", count);
                self.listener.on_queue_loaded(count).await;
                if count == 0 {
                    self.listener.on_queue_exhausted().await;
                }
                Ok(count)
            }
            Err(e) => {
                {
                    let mut inner = self.inner.lock().expect("swipe 锁中毒");
                    inner.state = SwipeSessionState::Error {
                        retryable: e.is_retryable(),
                    };
                }
                warn!("[Swipe] ❌ 候选队列加载失败: {}", e);
                Err(e)
            }
        }
    }

    /// 对当前候选人做一次 like/pass 决策
    ///
    /// 仅在 `Ready` 下有效；一个游标位置只会发出一次远端调用。
    /// 无论远端成败，游标都前进一格（失败只记录、不内联重试，
    /// 不阻塞继续浏览）；响应表明双向喜欢时返回产生的 [`MatchEvent`]
    pub async fn decide(&self, direction: SwipeDirection) -> Result<Option<MatchEvent>, ApiError> {
        let candidate = {
            let mut inner = self.inner.lock().expect("swipe 锁中毒");
            match inner.state {
                SwipeSessionState::Ready => {}
                SwipeSessionState::Deciding => {
                    return Err(ApiError::InvalidState("上一次滑动尚未完成".into()))
                }
                other => {
                    return Err(ApiError::InvalidState(format!(
                        "当前状态不可滑动: {:?}",
                        other
                    )))
                }
            }
            // Ready 状态下游标必然有效（滑完即转 Exhausted）
            let candidate = inner.queue[inner.cursor].clone();
            inner.state = SwipeSessionState::Deciding;
            candidate
        };

        let decision = SwipeDecision::new(candidate.id, direction);
        info!(
            "[Swipe] 对候选人 {} ({}) 记录 {} 决策",
            candidate.id,
            candidate.name,
            direction.as_str()
        );
        let result = self.gateway.record_decision(&decision).await;

        // 无论成败，游标前进；401 例外地终结会话
        let exhausted = {
            let mut inner = self.inner.lock().expect("swipe 锁中毒");
            inner.cursor += 1;
            let exhausted = inner.cursor >= inner.queue.len();
            inner.state = if matches!(result, Err(ApiError::Unauthorized)) {
                SwipeSessionState::Error { retryable: false }
            } else if exhausted {
                SwipeSessionState::Exhausted
            } else {
                SwipeSessionState::Ready
            };
            exhausted
        };

        let outcome = match result {
            Ok(outcome) if outcome.is_match => {
                let event = MatchEvent {
                    with_user_id: candidate.id,
                    with_user_name: candidate.name.clone(),
                    match_id: outcome.match_id.unwrap_or_default(),
                    timestamp: Utc::now(),
                };
                info!(
                    "[Swipe] 🎉 与 {} 互相喜欢，matchId={}",
                    candidate.name, event.match_id
                );
                self.notifier.show(event.clone());
                self.listener.on_match(event.clone()).await;
                Ok(Some(event))
            }
            Ok(_) => Ok(None),
            Err(ApiError::NotFound(detail)) => {
                // 候选人已不可用：视作空操作前进，不算失败
                info!("[Swipe] 候选人 {} 已不存在（{}），跳过", candidate.id, detail);
                Ok(None)
            }
            Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized),
            Err(e) => {
                warn!("[Swipe] ⚠️ 决策记录失败（不阻塞浏览）: {}", e);
                self.listener.on_decision_failed(candidate.id, e).await;
                Ok(None)
            }
        };

        if exhausted {
            info!("[Swipe] 队列已滑完");
            self.listener.on_queue_exhausted().await;
        }
        outcome
    }

    /// 当前状态
    pub fn state(&self) -> SwipeSessionState {
        self.inner.lock().expect("swipe 锁中毒").state
    }

    /// 当前待决策的候选人；队列未就绪或已滑完时为 None
    pub fn current_candidate(&self) -> Option<Candidate> {
        let inner = self.inner.lock().expect("swipe 锁中毒");
        inner.queue.get(inner.cursor).cloned()
    }

    /// 游标位置
    pub fn cursor(&self) -> usize {
        self.inner.lock().expect("swipe 锁中毒").cursor
    }

    /// 队列中剩余未决策的人数
    pub fn remaining(&self) -> usize {
        let inner = self.inner.lock().expect("swipe 锁中毒");
        inner.queue.len().saturating_sub(inner.cursor)
    }

    /// 匹配横幅状态（供 UI 观察）
    pub fn notifier(&self) -> &MatchNotifier {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ucme::discover::listener::EmptyDiscoverListener;
    use crate::ucme::testing::{outcome_match, outcome_plain, profile, ScriptedGateway};
    use std::time::Duration;

    fn new_session(gateway: Arc<ScriptedGateway>) -> SwipeSession {
        let listener: Arc<dyn DiscoverListener> = Arc::new(EmptyDiscoverListener);
        let notifier = MatchNotifier::new(Duration::from_secs(2), listener.clone());
        SwipeSession::new(gateway, notifier, listener)
    }

    #[tokio::test(start_paused = true)]
    async fn n_decisions_advance_cursor_to_n_despite_failures() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_candidates(Ok(vec![profile(1, "a"), profile(2, "b"), profile(3, "c")]));
        gateway.push_decision(Ok(outcome_plain()));
        gateway.push_decision(Err(ApiError::Network("连接超时".into())));
        gateway.push_decision(Err(ApiError::NotFound("已下线".into())));

        let session = new_session(gateway.clone());
        session.start().await.unwrap();
        assert_eq!(session.state(), SwipeSessionState::Ready);

        // 成功、网络失败、目标不存在：游标都照常前进
        assert!(session.decide(SwipeDirection::Like).await.unwrap().is_none());
        assert_eq!(session.cursor(), 1);
        assert!(session.decide(SwipeDirection::Pass).await.unwrap().is_none());
        assert_eq!(session.cursor(), 2);
        assert!(session.decide(SwipeDirection::Like).await.unwrap().is_none());
        assert_eq!(session.cursor(), 3);

        assert_eq!(session.state(), SwipeSessionState::Exhausted);
        assert_eq!(gateway.decision_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reentrant_decide_is_rejected_without_duplicate_call() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_candidates(Ok(vec![profile(1, "a"), profile(2, "b")]));
        // 第一次决策挂起 5 秒，期间的第二次 decide 必须被拒绝
        gateway.push_decision_delayed(Duration::from_secs(5), Ok(outcome_plain()));
        gateway.push_decision(Ok(outcome_plain()));

        let session = Arc::new(new_session(gateway.clone()));
        session.start().await.unwrap();

        let racing = {
            let session = session.clone();
            tokio::spawn(async move { session.decide(SwipeDirection::Like).await })
        };
        // 让第一次决策进入在途状态
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(session.state(), SwipeSessionState::Deciding);

        let second = session.decide(SwipeDirection::Like).await;
        assert!(matches!(second, Err(ApiError::InvalidState(_))));
        // 被拒绝的调用不前进游标、不产生重复远端调用
        assert_eq!(session.cursor(), 0);
        assert_eq!(gateway.decision_calls(), 1);

        racing.await.unwrap().unwrap();
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.state(), SwipeSessionState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn match_response_emits_single_event_and_auto_dismisses() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_candidates(Ok(vec![profile(9, "amy")]));
        gateway.push_decision(Ok(outcome_match(77)));

        let session = new_session(gateway.clone());
        session.start().await.unwrap();

        let event = session
            .decide(SwipeDirection::Like)
            .await
            .unwrap()
            .expect("应产生匹配事件");
        assert_eq!(event.match_id, 77);
        assert_eq!(event.with_user_id, 9);
        assert!(session.notifier().is_showing());

        // 固定展示窗口后自动消失
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!session.notifier().is_showing());
        assert_eq!(session.state(), SwipeSessionState::Exhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_queue_goes_straight_to_exhausted() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_candidates(Ok(vec![]));

        let session = new_session(gateway);
        assert_eq!(session.start().await.unwrap(), 0);
        assert_eq!(session.state(), SwipeSessionState::Exhausted);
        assert!(session.current_candidate().is_none());

        // Exhausted 下滑动被拒绝
        let res = session.decide(SwipeDirection::Like).await;
        assert!(matches!(res, Err(ApiError::InvalidState(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn load_failure_enters_retryable_error_and_refresh_recovers() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_candidates(Err(ApiError::Server {
            status: 503,
            detail: "unavailable".into(),
        }));
        gateway.push_candidates(Ok(vec![profile(1, "a")]));

        let session = new_session(gateway);
        assert!(session.start().await.is_err());
        assert_eq!(
            session.state(),
            SwipeSessionState::Error { retryable: true }
        );

        // start() 作为刷新是 Error 的唯一出路
        session.start().await.unwrap();
        assert_eq!(session.state(), SwipeSessionState::Ready);
        assert_eq!(session.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_decide_terminates_session() {
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push_candidates(Ok(vec![profile(1, "a"), profile(2, "b")]));
        gateway.push_decision(Err(ApiError::Unauthorized));

        let session = new_session(gateway);
        session.start().await.unwrap();

        let res = session.decide(SwipeDirection::Like).await;
        assert!(matches!(res, Err(ApiError::Unauthorized)));
        // 游标照常前进，但会话进入不可重试的错误态
        assert_eq!(session.cursor(), 1);
        assert_eq!(
            session.state(),
            SwipeSessionState::Error { retryable: false }
        );
    }
}
