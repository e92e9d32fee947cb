//! 匹配横幅
//!
//! 纯状态保持器：`none | showing(MatchEvent)`。进入 showing 后定时自动回到
//! none；展示期间到达的新事件直接替换并重置倒计时（last-event-wins，不排队）。

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

use crate::ucme::discover::listener::DiscoverListener;
use crate::ucme::discover::types::MatchEvent;

struct NotifierState {
    current: Option<MatchEvent>,
    /// 每次 show 递增；滞后到达的自动消失任务据此识别自己已过期
    epoch: u64,
}

/// 匹配横幅状态
#[derive(Clone)]
pub struct MatchNotifier {
    display_window: Duration,
    state: Arc<Mutex<NotifierState>>,
    listener: Arc<dyn DiscoverListener>,
}

impl MatchNotifier {
    pub fn new(display_window: Duration, listener: Arc<dyn DiscoverListener>) -> Self {
        Self {
            display_window,
            state: Arc::new(Mutex::new(NotifierState {
                current: None,
                epoch: 0,
            })),
            listener,
        }
    }

    /// 展示一个匹配事件，并安排固定时长后的自动消失
    ///
    /// 需要在 tokio 运行时内调用
    pub fn show(&self, event: MatchEvent) {
        let my_epoch = {
            let mut st = self.state.lock().expect("notifier 锁中毒");
            st.epoch += 1;
            if st.current.is_some() {
                debug!("[MatchNotifier] 展示期间到达新事件，替换并重置倒计时");
            }
            st.current = Some(event);
            st.epoch
        };

        let state = self.state.clone();
        let listener = self.listener.clone();
        let window = self.display_window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let dismissed = {
                let mut st = state.lock().expect("notifier 锁中毒");
                // 期间有新事件进来则本次倒计时作废
                if st.epoch == my_epoch {
                    st.current = None;
                    true
                } else {
                    false
                }
            };
            if dismissed {
                info!("[MatchNotifier] 匹配横幅展示期满，自动消失");
                listener.on_match_dismissed().await;
            }
        });
    }

    /// 当前展示中的事件；无展示时为 None
    pub fn current(&self) -> Option<MatchEvent> {
        self.state.lock().expect("notifier 锁中毒").current.clone()
    }

    pub fn is_showing(&self) -> bool {
        self.state.lock().expect("notifier 锁中毒").current.is_some()
    }
}
