pub mod auth;
pub mod client;
pub mod conversation;
pub mod discover;
pub mod gateway;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// 重新导出认证相关函数
pub use auth::{login_async, request_login_code};

// 重新导出核心组件
pub use client::{ClientConfig, UcmeClient};
pub use conversation::{ConversationChannel, ConversationListSyncer, ConversationSyncerConfig};
pub use discover::{MatchNotifier, SwipeSession};
pub use session::{Credential, SessionContext};
