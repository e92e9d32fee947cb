use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ucme::types::UserProfile;

/// 消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// 服务端消息 ID
    pub id: i64,
    /// 所属会话 ID
    #[serde(rename = "conversationId")]
    pub conversation_id: i64,
    /// 发送者用户 ID
    #[serde(rename = "senderId")]
    pub sender_id: i64,
    /// 消息正文
    pub content: String,
    /// 对方是否已读
    #[serde(rename = "isRead", default)]
    pub is_read: bool,
    /// 创建时间
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<NaiveDateTime>,
}

/// 会话摘要
///
/// 列表同步每次成功都会整体替换，不做逐字段合并
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    /// 会话 ID
    pub id: i64,
    #[serde(rename = "userId1")]
    pub user_id1: i64,
    #[serde(rename = "userId2")]
    pub user_id2: i64,
    /// 最近一条消息时间（列表按它降序）
    #[serde(rename = "lastMessageAt", default)]
    pub last_message_at: Option<NaiveDateTime>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<NaiveDateTime>,
    /// 最近一条消息摘要
    #[serde(rename = "lastMessage", default)]
    pub last_message: Option<Message>,
    /// 对方用户资料（含显示图片）
    #[serde(rename = "otherUser")]
    pub other_user: UserProfile,
    /// 未读消息数
    #[serde(rename = "unreadCount", default)]
    pub unread_count: i32,
}

/// 会话详情：摘要 + 全量消息历史
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub summary: Conversation,
    /// 按时间升序的消息列表，空列表是合法状态
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// 本端消息投递状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// 已本地追加，等待服务端确认
    Pending,
    /// 服务端已确认（携带服务端 ID 与时间戳）
    Confirmed,
    /// 发送失败，保留在历史中等待调用方重试或丢弃
    Failed,
}

/// 频道内的消息行
///
/// client_msg_id 是本端生成的临时键，在服务端确认前唯一标识该行，
/// 确认时按它原位替换，不做位置搜索
#[derive(Debug, Clone)]
pub struct ChannelMessage {
    /// 本端临时键（uuid），与服务端 ID 无关
    pub client_msg_id: String,
    /// 投递状态
    pub delivery_state: DeliveryState,
    /// 消息内容；Pending 时为本地构造，Confirmed 后为服务端版本
    pub message: Message,
}

impl ChannelMessage {
    pub fn is_pending(&self) -> bool {
        self.delivery_state == DeliveryState::Pending
    }

    pub fn is_failed(&self) -> bool {
        self.delivery_state == DeliveryState::Failed
    }
}
