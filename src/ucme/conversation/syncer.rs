//! 会话列表同步器
//!
//! 周期性拉取会话列表并整体替换本地快照；失败时保留上一份成功结果，
//! 只竖一个瞬时错误标志。循环是串行的：上一次拉取未返回前不会发起
//! 下一次，重叠的周期自然合并。

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ucme::conversation::listener::ConversationListener;
use crate::ucme::conversation::types::Conversation;
use crate::ucme::gateway::RemoteGateway;
use crate::ucme::types::ApiError;

/// 会话列表同步器配置
#[derive(Debug, Clone)]
pub struct ConversationSyncerConfig {
    /// 两次拉取之间的间隔
    pub interval: Duration,
    /// 每次拉取的分页大小
    pub page_limit: u32,
}

impl Default for ConversationSyncerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            page_limit: 20,
        }
    }
}

struct SyncState {
    conversations: Vec<Conversation>,
    /// 最近一次失败；下一次成功同步时清除
    last_error: Option<ApiError>,
    total_unread: i32,
    /// 每次 start/stop 递增；滞后到达的拉取结果据此被丢弃
    epoch: u64,
    running: bool,
}

/// 同步结果应用动作（在锁内判定，锁外触发回调）
enum Applied {
    Refreshed {
        snapshot: Vec<Conversation>,
        unread_changed: Option<i32>,
    },
    Failed(ApiError),
    /// 已停止或世代不符，结果被丢弃
    Discarded,
}

/// 会话列表同步器
///
/// start/stop 生命周期绑定消费方作用域；stop 是幂等的，
/// stop 之后任何在途拉取的结果都不会再写入状态
pub struct ConversationListSyncer {
    config: ConversationSyncerConfig,
    gateway: Arc<dyn RemoteGateway>,
    listener: Arc<dyn ConversationListener>,
    state: Arc<Mutex<SyncState>>,
    /// stop 时唤醒正在等待下个周期的循环
    stopped: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ConversationListSyncer {
    pub fn new(
        config: ConversationSyncerConfig,
        gateway: Arc<dyn RemoteGateway>,
        listener: Arc<dyn ConversationListener>,
    ) -> Self {
        Self {
            config,
            gateway,
            listener,
            state: Arc::new(Mutex::new(SyncState {
                conversations: Vec::new(),
                last_error: None,
                total_unread: 0,
                epoch: 0,
                running: false,
            })),
            stopped: Arc::new(Notify::new()),
            handle: Mutex::new(None),
        }
    }

    /// 启动同步循环：先立即拉取一次，之后按固定间隔重复
    ///
    /// 已在运行时调用是空操作
    pub fn start(&self) {
        // 本次启动的世代号：旧循环被 stop 后即使醒来也对不上号，直接退出
        let task_epoch = {
            let mut st = self.state.lock().expect("sync 锁中毒");
            if st.running {
                debug!("[ConvSync] 已在运行，忽略重复 start");
                return;
            }
            st.running = true;
            st.epoch += 1;
            st.epoch
        };
        info!(
            "[ConvSync] 🔄 启动会话列表同步，间隔 {:?}",
            self.config.interval
        );

        let gateway = self.gateway.clone();
        let listener = self.listener.clone();
        let state = self.state.clone();
        let stopped = self.stopped.clone();
        let interval = self.config.interval;
        let page_limit = self.config.page_limit;

        let task = tokio::spawn(async move {
            loop {
                // 每轮开始先验明身份；停止或换代后退出
                {
                    let st = state.lock().expect("sync 锁中毒");
                    if !st.running || st.epoch != task_epoch {
                        break;
                    }
                }

                let result = gateway.fetch_conversations(0, page_limit).await;

                // 应用结果前再次校验：停止后到达的响应直接丢弃，不触碰列表
                let applied = {
                    let mut st = state.lock().expect("sync 锁中毒");
                    if !st.running || st.epoch != task_epoch {
                        Applied::Discarded
                    } else {
                        match result {
                            Ok(list) => {
                                // 整体替换，不做合并；消失的条目自然被移除
                                st.conversations = list.clone();
                                st.last_error = None;
                                let total: i32 = list.iter().map(|c| c.unread_count).sum();
                                let unread_changed = if total != st.total_unread {
                                    st.total_unread = total;
                                    Some(total)
                                } else {
                                    None
                                };
                                Applied::Refreshed {
                                    snapshot: list,
                                    unread_changed,
                                }
                            }
                            Err(e) => {
                                st.last_error = Some(e.clone());
                                Applied::Failed(e)
                            }
                        }
                    }
                };

                match applied {
                    Applied::Refreshed {
                        snapshot,
                        unread_changed,
                    } => {
                        debug!("[ConvSync] ✅ 列表已刷新，共 {} 个会话", snapshot.len());
                        listener.on_list_refreshed(snapshot).await;
                        if let Some(total) = unread_changed {
                            debug!("[ConvSync] 📬 总未读数变更: {}", total);
                            listener.on_total_unread_changed(total).await;
                        }
                    }
                    Applied::Failed(e) => {
                        warn!("[ConvSync] ⚠️ 本次同步失败，保留上一份列表: {}", e);
                        listener.on_sync_failed(e).await;
                    }
                    Applied::Discarded => {
                        debug!("[ConvSync] 同步器已停止，丢弃滞后到达的拉取结果");
                        break;
                    }
                }

                // 等待下个周期；stop 会立刻打断等待
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stopped.notified() => break,
                }
            }
            debug!("[ConvSync] 同步循环退出");
        });

        *self.handle.lock().expect("handle 锁中毒") = Some(task);
    }

    /// 停止同步循环；幂等，重复调用是空操作
    ///
    /// 调用返回后，任何在途拉取的结果都不会再写入列表
    pub fn stop(&self) {
        {
            let mut st = self.state.lock().expect("sync 锁中毒");
            if !st.running {
                return;
            }
            st.running = false;
            st.epoch += 1;
        }
        self.stopped.notify_waiters();
        self.handle.lock().expect("handle 锁中毒").take();
        info!("[ConvSync] 已停止会话列表同步");
    }

    /// 当前列表快照（最近一次成功同步的结果）
    pub fn conversations(&self) -> Vec<Conversation> {
        self.state.lock().expect("sync 锁中毒").conversations.clone()
    }

    /// 最近一次失败；下一次成功同步时自动清除
    pub fn last_error(&self) -> Option<ApiError> {
        self.state.lock().expect("sync 锁中毒").last_error.clone()
    }

    /// 总未读消息数
    pub fn total_unread(&self) -> i32 {
        self.state.lock().expect("sync 锁中毒").total_unread
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().expect("sync 锁中毒").running
    }
}

impl Drop for ConversationListSyncer {
    fn drop(&mut self) {
        // 作用域结束时务必收回定时任务，不留孤儿循环
        self.stop();
    }
}
