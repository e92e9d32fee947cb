pub mod ucme;

// 重新导出常用类型和函数，方便外部使用
pub use ucme::{
    client::{ClientConfig, UcmeClient},
    conversation::{Conversation, ConversationChannel, ConversationListSyncer, Message},
    discover::{MatchEvent, SwipeDirection, SwipeSession},
    login_async,
};
