//! 会话频道
//!
//! 持有一个已打开会话的消息历史。本端发出的消息先以待确认状态乐观
//! 追加，服务端确认后按临时键原位替换；失败的消息原位标记、保留在
//! 历史中，由调用方决定重发或丢弃。历史从本端视角是只追加的，确认
//! 从不重排已有条目。

use chrono::Utc;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ucme::conversation::listener::MessageListener;
use crate::ucme::conversation::types::{
    ChannelMessage, Conversation, DeliveryState, Message,
};
use crate::ucme::gateway::RemoteGateway;
use crate::ucme::session::SessionContext;
use crate::ucme::types::ApiError;

struct ChannelState {
    conversation: Option<Conversation>,
    messages: Vec<ChannelMessage>,
}

/// 会话频道，按会话 ID 建立
pub struct ConversationChannel {
    conversation_id: i64,
    gateway: Arc<dyn RemoteGateway>,
    session: Arc<SessionContext>,
    listener: Arc<dyn MessageListener>,
    state: Arc<Mutex<ChannelState>>,
}

impl ConversationChannel {
    pub fn new(
        conversation_id: i64,
        gateway: Arc<dyn RemoteGateway>,
        session: Arc<SessionContext>,
        listener: Arc<dyn MessageListener>,
    ) -> Self {
        Self {
            conversation_id,
            gateway,
            session,
            listener,
            state: Arc::new(Mutex::new(ChannelState {
                conversation: None,
                messages: Vec::new(),
            })),
        }
    }

    /// 打开频道：拉取一次全量历史；没有消息的空会话是合法状态
    pub async fn open(&self) -> Result<(), ApiError> {
        info!("[Channel] 打开会话 {}", self.conversation_id);
        let detail = self.gateway.fetch_conversation(self.conversation_id).await?;
        let count = detail.messages.len();
        {
            let mut st = self.state.lock().expect("channel 锁中毒");
            st.conversation = Some(detail.summary);
            st.messages = detail
                .messages
                .into_iter()
                .map(|message| ChannelMessage {
                    client_msg_id: Uuid::new_v4().to_string(),
                    delivery_state: DeliveryState::Confirmed,
                    message,
                })
                .collect();
        }
        info!("[Channel] ✅ 历史加载完成，共 {} 条", count);
        self.listener
            .on_history_loaded(self.conversation_id, count)
            .await;
        Ok(())
    }

    /// 发送一条消息
    ///
    /// 空白内容在发出请求前即被拒绝。合法内容先乐观追加为待确认行
    /// （追加是同步完成的，远端未返回前本端视图就能看到），随后发起
    /// 远端调用并按临时键原位确认或标记失败
    pub async fn send(&self, content: &str) -> Result<Message, ApiError> {
        if content.trim().is_empty() {
            debug!("[Channel] 空白消息被拦截，不发起请求");
            return Err(ApiError::Validation("消息内容不能为空".into()));
        }

        let pending = {
            let mut st = self.state.lock().expect("channel 锁中毒");
            if st.conversation.is_none() {
                return Err(ApiError::InvalidState("会话尚未打开".into()));
            }
            let row = ChannelMessage {
                client_msg_id: Uuid::new_v4().to_string(),
                delivery_state: DeliveryState::Pending,
                message: Message {
                    // 服务端 ID 未分配前置 0，确认时整体替换
                    id: 0,
                    conversation_id: self.conversation_id,
                    sender_id: self.session.user_id().unwrap_or_default(),
                    content: content.to_string(),
                    is_read: false,
                    created_at: Some(Utc::now().naive_utc()),
                },
            };
            st.messages.push(row.clone());
            row
        };
        self.listener.on_message_appended(pending.clone()).await;

        self.dispatch(pending.client_msg_id, content.to_string()).await
    }

    /// 重发一条此前发送失败的消息；复用同一临时键，确认仍是原位替换
    pub async fn resend(&self, client_msg_id: &str) -> Result<Message, ApiError> {
        let content = {
            let mut st = self.state.lock().expect("channel 锁中毒");
            let Some(row) = st
                .messages
                .iter_mut()
                .find(|m| m.client_msg_id == client_msg_id)
            else {
                return Err(ApiError::InvalidState("消息不存在".into()));
            };
            if !row.is_failed() {
                return Err(ApiError::InvalidState("只有发送失败的消息可以重发".into()));
            }
            row.delivery_state = DeliveryState::Pending;
            row.message.content.clone()
        };
        info!("[Channel] 🔁 重发消息 {}", client_msg_id);
        self.dispatch(client_msg_id.to_string(), content).await
    }

    /// 丢弃一条发送失败的消息（唯一允许从历史中移除条目的路径）
    pub fn discard_failed(&self, client_msg_id: &str) -> Result<(), ApiError> {
        let mut st = self.state.lock().expect("channel 锁中毒");
        let Some(idx) = st
            .messages
            .iter()
            .position(|m| m.client_msg_id == client_msg_id)
        else {
            return Err(ApiError::InvalidState("消息不存在".into()));
        };
        if !st.messages[idx].is_failed() {
            return Err(ApiError::InvalidState("只有发送失败的消息可以丢弃".into()));
        }
        st.messages.remove(idx);
        debug!("[Channel] 已丢弃失败消息 {}", client_msg_id);
        Ok(())
    }

    /// 将会话中收到的消息标记为已读，并把本地未读数清零
    pub async fn mark_read(&self) -> Result<(), ApiError> {
        {
            let st = self.state.lock().expect("channel 锁中毒");
            if st.conversation.is_none() {
                return Err(ApiError::InvalidState("会话尚未打开".into()));
            }
        }
        self.gateway
            .mark_conversation_read(self.conversation_id)
            .await?;
        let mut st = self.state.lock().expect("channel 锁中毒");
        if let Some(conv) = st.conversation.as_mut() {
            conv.unread_count = 0;
        }
        Ok(())
    }

    /// 发出远端调用并按临时键原位收尾
    async fn dispatch(&self, client_msg_id: String, content: String) -> Result<Message, ApiError> {
        match self.gateway.send_message(self.conversation_id, &content).await {
            Ok(confirmed) => {
                let row = {
                    let mut st = self.state.lock().expect("channel 锁中毒");
                    // 同步更新摘要里的最近消息
                    if let Some(conv) = st.conversation.as_mut() {
                        conv.last_message_at = confirmed.created_at;
                        conv.last_message = Some(confirmed.clone());
                    }
                    let Some(row) = st
                        .messages
                        .iter_mut()
                        .find(|m| m.client_msg_id == client_msg_id)
                    else {
                        // 待确认行不会被移除（discard 只作用于失败行），找不到时直接返回
                        return Ok(confirmed);
                    };
                    row.message = confirmed.clone();
                    row.delivery_state = DeliveryState::Confirmed;
                    row.clone()
                };
                debug!(
                    "[Channel] ✅ 消息已确认，服务端ID: {}",
                    row.message.id
                );
                self.listener.on_message_confirmed(row).await;
                Ok(confirmed)
            }
            Err(e) => {
                let row = {
                    let mut st = self.state.lock().expect("channel 锁中毒");
                    let row = st
                        .messages
                        .iter_mut()
                        .find(|m| m.client_msg_id == client_msg_id);
                    row.map(|r| {
                        r.delivery_state = DeliveryState::Failed;
                        r.clone()
                    })
                };
                warn!("[Channel] ⚠️ 消息发送失败，原位保留: {}", e);
                if let Some(row) = row {
                    self.listener.on_message_failed(row).await;
                }
                Err(e)
            }
        }
    }

    /// 会话摘要快照
    pub fn conversation(&self) -> Option<Conversation> {
        self.state
            .lock()
            .expect("channel 锁中毒")
            .conversation
            .clone()
    }

    /// 消息历史快照（含待确认/失败行）
    pub fn messages(&self) -> Vec<ChannelMessage> {
        self.state.lock().expect("channel 锁中毒").messages.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state
            .lock()
            .expect("channel 锁中毒")
            .conversation
            .is_some()
    }

    pub fn conversation_id(&self) -> i64 {
        self.conversation_id
    }
}
