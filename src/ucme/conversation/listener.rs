use async_trait::async_trait;

use crate::ucme::conversation::types::{ChannelMessage, Conversation};
use crate::ucme::types::ApiError;

/// 会话列表同步回调接口
#[async_trait]
pub trait ConversationListener: Send + Sync {
    /// 一次成功同步后整体替换的新列表
    async fn on_list_refreshed(&self, conversations: Vec<Conversation>);

    /// 某次同步失败（上一份列表原样保留）
    async fn on_sync_failed(&self, error: ApiError);

    /// 总未读消息数变更
    async fn on_total_unread_changed(&self, total_unread: i32);
}

/// 空实现（默认监听器）
pub struct EmptyConversationListener;

#[async_trait]
impl ConversationListener for EmptyConversationListener {
    async fn on_list_refreshed(&self, _conversations: Vec<Conversation>) {}
    async fn on_sync_failed(&self, _error: ApiError) {}
    async fn on_total_unread_changed(&self, _total_unread: i32) {}
}

/// 单个会话频道的消息回调接口
#[async_trait]
pub trait MessageListener: Send + Sync {
    /// 历史消息加载完成
    async fn on_history_loaded(&self, conversation_id: i64, count: usize);

    /// 本端乐观追加了一条待确认消息
    async fn on_message_appended(&self, message: ChannelMessage);

    /// 待确认消息被服务端确认（原位替换为服务端版本）
    async fn on_message_confirmed(&self, message: ChannelMessage);

    /// 消息发送失败（原位标记，保留在历史中）
    async fn on_message_failed(&self, message: ChannelMessage);
}

/// 空实现（默认监听器）
pub struct EmptyMessageListener;

#[async_trait]
impl MessageListener for EmptyMessageListener {
    async fn on_history_loaded(&self, _conversation_id: i64, _count: usize) {}
    async fn on_message_appended(&self, _message: ChannelMessage) {}
    async fn on_message_confirmed(&self, _message: ChannelMessage) {}
    async fn on_message_failed(&self, _message: ChannelMessage) {}
}
