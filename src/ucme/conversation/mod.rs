pub mod channel;
pub mod listener;
pub mod syncer;
pub mod types;

pub use channel::ConversationChannel;
pub use listener::{
    ConversationListener, EmptyConversationListener, EmptyMessageListener, MessageListener,
};
pub use syncer::{ConversationListSyncer, ConversationSyncerConfig};
pub use types::{ChannelMessage, Conversation, ConversationDetail, DeliveryState, Message};
