//! UCMe 客户端门面
//!
//! 把登录态、网关和各个同步组件装配到一起：登录/登出走这里，
//! 浏览会话、会话列表同步器和会话频道也从这里构造并接好监听器。

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::ucme::auth::{self, VerificationResponse};
use crate::ucme::conversation::channel::ConversationChannel;
use crate::ucme::conversation::listener::{
    ConversationListener, EmptyConversationListener, EmptyMessageListener, MessageListener,
};
use crate::ucme::conversation::syncer::{ConversationListSyncer, ConversationSyncerConfig};
use crate::ucme::discover::listener::{DiscoverListener, EmptyDiscoverListener};
use crate::ucme::discover::notifier::MatchNotifier;
use crate::ucme::discover::session::SwipeSession;
use crate::ucme::discover::types::MatchEntry;
use crate::ucme::gateway::{HttpRemoteGateway, RemoteGateway};
use crate::ucme::session::{Credential, SessionContext, SessionListener};
use crate::ucme::types::{ApiError, UserProfile};

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// HTTP API 基础地址
    pub api_base_url: String,
    /// 会话列表同步间隔
    pub sync_interval: Duration,
    /// 匹配横幅展示时长
    pub match_display_window: Duration,
    /// 会话列表分页大小
    pub page_limit: u32,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            sync_interval: Duration::from_secs(30),
            match_display_window: Duration::from_secs(2),
            page_limit: 20,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// UCMe 客户端
pub struct UcmeClient {
    config: ClientConfig,
    session: Arc<SessionContext>,
    gateway: Arc<HttpRemoteGateway>,
    // 监听器（可由调用方注册）
    discover_listener: Arc<dyn DiscoverListener>,
    conversation_listener: Arc<dyn ConversationListener>,
    message_listener: Arc<dyn MessageListener>,
}

impl UcmeClient {
    pub fn new(config: ClientConfig) -> Self {
        let session = Arc::new(SessionContext::new());
        let gateway = Arc::new(HttpRemoteGateway::new(
            config.api_base_url.clone(),
            session.clone(),
        ));
        Self {
            config,
            session,
            gateway,
            discover_listener: Arc::new(EmptyDiscoverListener),
            conversation_listener: Arc::new(EmptyConversationListener),
            message_listener: Arc::new(EmptyMessageListener),
        }
    }

    /// 注册登录态监听器
    pub fn set_session_listener(&self, listener: Arc<dyn SessionListener>) {
        self.session.set_listener(listener);
    }

    /// 注册浏览会话监听器（对之后构造的 SwipeSession 生效）
    pub fn set_discover_listener(&mut self, listener: Arc<dyn DiscoverListener>) {
        self.discover_listener = listener;
    }

    /// 注册会话列表监听器（对之后构造的同步器生效）
    pub fn set_conversation_listener(&mut self, listener: Arc<dyn ConversationListener>) {
        self.conversation_listener = listener;
    }

    /// 注册消息监听器（对之后构造的频道生效）
    pub fn set_message_listener(&mut self, listener: Arc<dyn MessageListener>) {
        self.message_listener = listener;
    }

    /// 请求向校园邮箱发送登录验证码
    pub async fn request_login_code(&self, email: &str) -> Result<VerificationResponse, ApiError> {
        auth::request_login_code(&self.config.api_base_url, email).await
    }

    /// 邮箱验证码登录
    ///
    /// 登录接口只返回 token，随后拉一次当前用户资料拿到用户 ID，
    /// 两步都成功才写入凭证
    pub async fn login(&self, email: &str, verification_code: &str) -> Result<UserProfile, ApiError> {
        let token = auth::login_async(
            &self.config.api_base_url,
            email.to_string(),
            verification_code.to_string(),
        )
        .await?;
        let profile = auth::fetch_my_profile(&self.config.api_base_url, &token.access_token).await?;
        self.session.login(Credential {
            user_id: profile.id,
            token: token.access_token,
        });
        Ok(profile)
    }

    /// 登出：清空凭证，之后所有网关调用都会被拒绝
    pub fn logout(&self) {
        self.session.logout();
        info!("[Client] 已登出");
    }

    pub fn session(&self) -> Arc<SessionContext> {
        self.session.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    /// 构造一个接好监听器的浏览会话
    pub fn swipe_session(&self) -> SwipeSession {
        let notifier = MatchNotifier::new(
            self.config.match_display_window,
            self.discover_listener.clone(),
        );
        SwipeSession::new(self.gateway.clone(), notifier, self.discover_listener.clone())
    }

    /// 构造一个接好监听器的会话列表同步器（需调用方 start）
    pub fn conversation_syncer(&self) -> ConversationListSyncer {
        ConversationListSyncer::new(
            ConversationSyncerConfig {
                interval: self.config.sync_interval,
                page_limit: self.config.page_limit,
            },
            self.gateway.clone(),
            self.conversation_listener.clone(),
        )
    }

    /// 构造指定会话的频道（不拉历史）
    pub fn conversation_channel(&self, conversation_id: i64) -> ConversationChannel {
        ConversationChannel::new(
            conversation_id,
            self.gateway.clone(),
            self.session.clone(),
            self.message_listener.clone(),
        )
    }

    /// 构造并打开指定会话的频道
    pub async fn open_conversation(
        &self,
        conversation_id: i64,
    ) -> Result<ConversationChannel, ApiError> {
        let channel = self.conversation_channel(conversation_id);
        channel.open().await?;
        Ok(channel)
    }

    /// 拉取已有匹配列表
    pub async fn get_matches(&self) -> Result<Vec<MatchEntry>, ApiError> {
        self.gateway.fetch_matches().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ucme::discover::types::SwipeDirection;
    use std::sync::Once;
    use tracing::{error, info};

    static INIT_LOGGER: Once = Once::new();

    fn init_test_logger() {
        INIT_LOGGER.call_once(|| {
            use tracing_subscriber::prelude::*;
            use tracing_subscriber::EnvFilter;

            // 测试中默认打开当前 crate 的 debug，关闭底层 HTTP 客户端的噪音
            let filter_layer = EnvFilter::new(
                "info,ucme_sdk_core_rust=debug,hyper_util::client=info,reqwest=info",
            );

            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_test_writer();

            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt_layer)
                .init();
        });
    }

    #[test]
    fn config_defaults_match_backend_dev_setup() {
        let config = ClientConfig::new();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.sync_interval, Duration::from_secs(30));
        assert_eq!(config.match_display_window, Duration::from_secs(2));
    }

    /// 对本地后端的连通性测试，需要先在邮箱里拿到验证码，平时跳过
    #[tokio::test]
    #[ignore]
    async fn run_ucme_client() {
        init_test_logger();

        let client = UcmeClient::new(ClientConfig::new());
        let profile = match client.login("bruin@ucla.edu", "123456").await {
            Ok(profile) => {
                info!("✅ 登录成功！用户: {}", profile.name);
                profile
            }
            Err(e) => {
                error!("登录失败: {}", e);
                return;
            }
        };
        info!("当前用户ID: {}", profile.id);

        // 浏览几张卡片
        let session = client.swipe_session();
        if session.start().await.is_ok() {
            while session.remaining() > 0 {
                match session.decide(SwipeDirection::Like).await {
                    Ok(Some(event)) => info!("🎉 匹配: {}", event.with_user_name),
                    Ok(None) => {}
                    Err(e) => {
                        error!("滑动失败: {}", e);
                        break;
                    }
                }
            }
        }

        // 会话列表同步 + 打开第一个会话
        let syncer = client.conversation_syncer();
        syncer.start();
        tokio::time::sleep(Duration::from_secs(2)).await;
        if let Some(conv) = syncer.conversations().first() {
            let channel = client.open_conversation(conv.id).await.unwrap();
            let _ = channel.send("来自 Rust 客户端的问候").await;
        }
        syncer.stop();
    }
}
