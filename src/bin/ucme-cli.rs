//! UCMe CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试和展示核心同步功能
//! 启动时通过命令行参数指定账号，自动登录，滑完候选队列后
//! 持续同步会话列表并展示收到的所有回调

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use ucme_sdk_core_rust::ucme::client::{ClientConfig, UcmeClient};
use ucme_sdk_core_rust::ucme::conversation::listener::{ConversationListener, MessageListener};
use ucme_sdk_core_rust::ucme::conversation::types::{ChannelMessage, Conversation};
use ucme_sdk_core_rust::ucme::discover::listener::DiscoverListener;
use ucme_sdk_core_rust::ucme::discover::types::{MatchEvent, SwipeDirection};
use ucme_sdk_core_rust::ucme::session::SessionListener;
use ucme_sdk_core_rust::ucme::types::ApiError;

/// UCMe CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "ucme-cli")]
#[command(about = "UCMe CLI 客户端 - 用于测试和展示核心同步功能", long_about = None)]
struct Args {
    /// 校园邮箱
    #[arg(short, long, default_value = "bruin@ucla.edu")]
    email: String,

    /// 邮箱验证码（先用 --request-code 获取）
    #[arg(short, long, default_value = "123456")]
    code: String,

    /// 只请求发送验证码然后退出
    #[arg(long)]
    request_code: bool,

    /// API 基础地址
    #[arg(long, default_value = "http://localhost:8000")]
    api_url: String,

    /// 运行时长（秒），0 表示持续运行
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// 日志级别（默认: info,ucme_sdk_core_rust=debug）
    #[arg(long, default_value = "info,ucme_sdk_core_rust=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 创建日志文件（追加模式）
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("无法创建日志文件 debug.log");

    // 输出到 stdout（控制台），保留 ANSI 颜色代码用于终端显示
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码（文件不需要颜色）
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
}

/// 设置监听器（输出所有接收到的回调）
fn setup_listeners(client: &mut UcmeClient) {
    // 登录态监听器
    struct CliSessionListener;
    impl SessionListener for CliSessionListener {
        fn on_login(&self, user_id: i64) {
            info!("[CLI/Session] ✅ 已登录，用户ID: {}", user_id);
        }
        fn on_logout(&self) {
            info!("[CLI/Session] 👋 已登出");
        }
        fn on_session_invalidated(&self) {
            error!("[CLI/Session] ⚠️ 登录态失效，请重新登录");
        }
    }
    client.set_session_listener(Arc::new(CliSessionListener));

    // 浏览会话监听器
    struct CliDiscoverListener;
    #[async_trait]
    impl DiscoverListener for CliDiscoverListener {
        async fn on_queue_loaded(&self, count: usize) {
            info!("[CLI/Discover] 📋 候选队列就绪: {} 人", count);
        }

        async fn on_queue_exhausted(&self) {
            info!("[CLI/Discover] 🏁 队列已滑完");
        }

        async fn on_decision_failed(&self, target_id: i64, error: ApiError) {
            warn!(
                "[CLI/Discover] ⚠️ 决策记录失败: target={}, error={}",
                target_id, error
            );
        }

        async fn on_match(&self, event: MatchEvent) {
            info!(
                "[CLI/Discover] 🎉 It's a Match! 与 {} 互相喜欢 (matchId={})",
                event.with_user_name, event.match_id
            );
        }

        async fn on_match_dismissed(&self) {
            info!("[CLI/Discover] 匹配横幅已消失");
        }
    }
    client.set_discover_listener(Arc::new(CliDiscoverListener));

    // 会话列表监听器
    struct CliConversationListener;
    #[async_trait]
    impl ConversationListener for CliConversationListener {
        async fn on_list_refreshed(&self, conversations: Vec<Conversation>) {
            info!("[CLI/Conversation] 🔄 列表已刷新: {} 个会话", conversations.len());
        }

        async fn on_sync_failed(&self, error: ApiError) {
            warn!("[CLI/Conversation] ⚠️ 同步失败: {}", error);
        }

        async fn on_total_unread_changed(&self, total_unread: i32) {
            info!("[CLI/Conversation] 📬 总未读数: {}", total_unread);
        }
    }
    client.set_conversation_listener(Arc::new(CliConversationListener));

    // 消息监听器
    struct CliMessageListener;
    #[async_trait]
    impl MessageListener for CliMessageListener {
        async fn on_history_loaded(&self, conversation_id: i64, count: usize) {
            info!(
                "[CLI/Message] 📥 会话 {} 历史加载完成: {} 条",
                conversation_id, count
            );
        }

        async fn on_message_appended(&self, message: ChannelMessage) {
            info!("[CLI/Message] ✏️ 本地追加: {}", message.message.content);
        }

        async fn on_message_confirmed(&self, message: ChannelMessage) {
            info!(
                "[CLI/Message] ✅ 已确认 (服务端ID {}): {}",
                message.message.id, message.message.content
            );
        }

        async fn on_message_failed(&self, message: ChannelMessage) {
            error!("[CLI/Message] ❌ 发送失败: {}", message.message.content);
        }
    }
    client.set_message_listener(Arc::new(CliMessageListener));
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    init_logger(&args.log_level);

    info!("[CLI] 🚀 UCMe CLI 客户端（测试模式）");
    info!("[CLI] 📧 邮箱: {}", args.email);
    info!("[CLI] ⏱️  运行时长: {} 秒（0=持续运行）", args.duration);

    let config = ClientConfig {
        api_base_url: args.api_url.clone(),
        ..ClientConfig::new()
    };
    let mut client = UcmeClient::new(config);
    setup_listeners(&mut client);

    // 只请求验证码：发完即退出，等用户查收邮件后带 --code 重跑
    if args.request_code {
        info!("[CLI] 📡 正在请求发送登录验证码...");
        let resp = client
            .request_login_code(&args.email)
            .await
            .map_err(|e| anyhow::anyhow!("请求验证码失败: {}", e))?;
        info!("[CLI] ✅ {}", resp.message);
        return Ok(());
    }

    // 登录
    info!("[CLI] 🔐 正在登录...");
    let profile = client
        .login(&args.email, &args.code)
        .await
        .map_err(|e| anyhow::anyhow!("登录失败: {}", e))?;
    info!("[CLI] ✅ 登录成功！{} (ID: {})", profile.name, profile.id);

    // 浏览候选队列：交替 like/pass 滑完整个队列
    let session = client.swipe_session();
    match session.start().await {
        Ok(count) => {
            info!("[CLI] 🃏 开始浏览 {} 位候选人", count);
            let mut index = 0usize;
            while let Some(candidate) = session.current_candidate() {
                let direction = if index % 2 == 0 {
                    SwipeDirection::Like
                } else {
                    SwipeDirection::Pass
                };
                info!(
                    "[CLI]   - {} | {} | {}",
                    candidate.name, candidate.college, direction.as_str()
                );
                if let Err(e) = session.decide(direction).await {
                    error!("[CLI] 滑动失败: {}", e);
                    break;
                }
                index += 1;
            }
        }
        Err(e) => {
            error!("[CLI] 候选队列加载失败: {}", e);
        }
    }

    // 展示已有匹配
    if let Ok(matches) = client.get_matches().await {
        info!("[CLI] 💞 匹配列表（共 {} 个）:", matches.len());
        for entry in matches.iter().take(5) {
            info!("[CLI]   - {} (matchId={})", entry.user.name, entry.match_id);
        }
    }

    // 启动会话列表同步
    let syncer = client.conversation_syncer();
    syncer.start();

    // 给首次同步一点时间，然后打开第一个会话发一条消息
    sleep(Duration::from_secs(2)).await;
    if let Some(conv) = syncer.conversations().first() {
        info!(
            "[CLI] 💬 打开会话 {} (对方: {})",
            conv.id, conv.other_user.name
        );
        match client.open_conversation(conv.id).await {
            Ok(channel) => {
                if let Err(e) = channel.send("来自 Rust 客户端的问候 👋").await {
                    error!("[CLI] 消息发送失败: {}", e);
                }
                if let Err(e) = channel.mark_read().await {
                    warn!("[CLI] 标记已读失败: {}", e);
                }
            }
            Err(e) => error!("[CLI] 打开会话失败: {}", e),
        }
    } else {
        info!("[CLI] 暂无会话");
    }

    info!("[CLI] 📥 持续同步中，所有回调都会打印到日志");
    if args.duration > 0 {
        info!("[CLI] ⏰ {} 秒后自动退出", args.duration);
        sleep(Duration::from_secs(args.duration)).await;
        syncer.stop();
        info!("[CLI] 👋 程序退出");
    } else {
        info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
        // 持续运行直到被中断
        loop {
            sleep(Duration::from_secs(3600)).await;
        }
    }

    Ok(())
}
