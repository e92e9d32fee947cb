//! 远端网关
//!
//! 无状态请求门面：核心需要的全部远端能力都收敛在 [`RemoteGateway`] 上。
//! 每次调用从 SessionContext 读取当前凭证（而不是在构造时缓存），
//! 因此登出/换证后的下一次调用立即生效。网关自身从不重试，
//! 重试策略属于调用方。

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ucme::conversation::types::{Conversation, ConversationDetail, Message};
use crate::ucme::discover::types::{
    Candidate, DecisionOutcome, MatchEntry, SwipeDecision, SwipeDirection,
};
use crate::ucme::session::SessionContext;
use crate::ucme::types::{handle_json_response, ApiError};

/// 核心依赖的远端能力
///
/// 单测通过替换此 trait 注入脚本化的响应序列
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// 拉取候选队列（服务端已排序，展示顺序 = 响应顺序）
    async fn fetch_candidates(&self) -> Result<Vec<Candidate>, ApiError>;

    /// 记录一次滑动决策，返回是否构成匹配
    async fn record_decision(&self, decision: &SwipeDecision) -> Result<DecisionOutcome, ApiError>;

    /// 拉取已有匹配列表
    async fn fetch_matches(&self) -> Result<Vec<MatchEntry>, ApiError>;

    /// 分页拉取会话列表
    async fn fetch_conversations(&self, skip: u32, limit: u32) -> Result<Vec<Conversation>, ApiError>;

    /// 拉取单个会话的摘要与全量消息历史
    async fn fetch_conversation(&self, conversation_id: i64) -> Result<ConversationDetail, ApiError>;

    /// 发送消息，返回服务端确认后的消息
    async fn send_message(&self, conversation_id: i64, content: &str) -> Result<Message, ApiError>;

    /// 将会话内收到的消息标记为已读
    async fn mark_conversation_read(&self, conversation_id: i64) -> Result<(), ApiError>;
}

/// 基于 reqwest 的网关实现
pub struct HttpRemoteGateway {
    client: reqwest::Client,
    api_base_url: String,
    session: Arc<SessionContext>,
}

impl HttpRemoteGateway {
    pub fn new(api_base_url: String, session: Arc<SessionContext>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base_url,
            session,
        }
    }

    /// 调用时读取凭证；未登录直接判定未授权，不发请求
    fn bearer_token(&self) -> Result<String, ApiError> {
        match self.session.credential() {
            Some(c) => Ok(format!("Bearer {}", c.token)),
            None => {
                warn!("[Gateway] 未登录状态下发起调用，直接拒绝");
                Err(ApiError::Unauthorized)
            }
        }
    }

    /// 401 属于登录态级失败：在网关边界上报给 SessionContext，不向上吞掉
    fn observe<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(ApiError::Unauthorized) = &result {
            self.session.invalidate();
        }
        result
    }
}

#[async_trait]
impl RemoteGateway for HttpRemoteGateway {
    async fn fetch_candidates(&self) -> Result<Vec<Candidate>, ApiError> {
        let auth = self.bearer_token()?;
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/recommendations/discover", self.api_base_url);

        info!("[Gateway] 📡 拉取候选队列");
        debug!("[Gateway]   URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth)
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("请求失败: {}", e)))?;

        let result = handle_json_response::<Vec<Candidate>>(response, "候选队列").await;
        if let Ok(list) = &result {
            info!("[Gateway] ✅ 候选队列返回 {} 人", list.len());
        }
        self.observe(result)
    }

    async fn record_decision(&self, decision: &SwipeDecision) -> Result<DecisionOutcome, ApiError> {
        let auth = self.bearer_token()?;
        // 决策自带幂等随机数，直接作为 operationID 发出
        let path = match decision.direction {
            SwipeDirection::Like => "interactions/like",
            SwipeDirection::Pass => "interactions/pass",
        };
        let url = format!("{}/{}", self.api_base_url, path);

        info!(
            "[Gateway] 📡 记录决策: target={}, direction={}",
            decision.target_id,
            decision.direction.as_str()
        );
        debug!("[Gateway]   URL: {}, 操作ID: {}", url, decision.request_id);

        let response = self
            .client
            .post(&url)
            .query(&[("targetId", decision.target_id)])
            .header("Authorization", auth)
            .header("operationID", &decision.request_id)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("请求失败: {}", e)))?;

        let result = handle_json_response::<DecisionOutcome>(response, "记录决策").await;
        if let Ok(outcome) = &result {
            debug!(
                "[Gateway]   决策已记录: isMatch={}, matchId={:?}",
                outcome.is_match, outcome.match_id
            );
        }
        self.observe(result)
    }

    async fn fetch_matches(&self) -> Result<Vec<MatchEntry>, ApiError> {
        let auth = self.bearer_token()?;
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/interactions/matches", self.api_base_url);

        info!("[Gateway] 📡 拉取匹配列表");
        debug!("[Gateway]   URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth)
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("请求失败: {}", e)))?;

        let result = handle_json_response::<Vec<MatchEntry>>(response, "匹配列表").await;
        if let Ok(list) = &result {
            info!("[Gateway] ✅ 匹配列表返回 {} 条", list.len());
        }
        self.observe(result)
    }

    async fn fetch_conversations(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Conversation>, ApiError> {
        let auth = self.bearer_token()?;
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/messages/conversations", self.api_base_url);

        debug!(
            "[Gateway] 📡 拉取会话列表: skip={}, limit={}, 操作ID: {}",
            skip, limit, operation_id
        );

        let response = self
            .client
            .get(&url)
            .query(&[("skip", skip), ("limit", limit)])
            .header("Authorization", auth)
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("请求失败: {}", e)))?;

        self.observe(handle_json_response(response, "会话列表").await)
    }

    async fn fetch_conversation(
        &self,
        conversation_id: i64,
    ) -> Result<ConversationDetail, ApiError> {
        let auth = self.bearer_token()?;
        let operation_id = Uuid::new_v4().to_string();
        let url = format!(
            "{}/messages/conversations/{}",
            self.api_base_url, conversation_id
        );

        info!("[Gateway] 📡 拉取会话详情: conversationId={}", conversation_id);
        debug!("[Gateway]   URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", auth)
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("请求失败: {}", e)))?;

        let result = handle_json_response::<ConversationDetail>(response, "会话详情").await;
        if let Ok(detail) = &result {
            info!(
                "[Gateway] ✅ 会话详情返回，历史消息 {} 条",
                detail.messages.len()
            );
        }
        self.observe(result)
    }

    async fn send_message(&self, conversation_id: i64, content: &str) -> Result<Message, ApiError> {
        let auth = self.bearer_token()?;
        let operation_id = Uuid::new_v4().to_string();
        let url = format!(
            "{}/messages/conversations/{}/messages",
            self.api_base_url, conversation_id
        );

        info!("[Gateway] 📤 发送消息: conversationId={}", conversation_id);
        debug!("[Gateway]   URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Authorization", auth)
            .header("operationID", &operation_id)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("请求失败: {}", e)))?;

        self.observe(handle_json_response(response, "发送消息").await)
    }

    async fn mark_conversation_read(&self, conversation_id: i64) -> Result<(), ApiError> {
        let auth = self.bearer_token()?;
        let operation_id = Uuid::new_v4().to_string();
        let url = format!(
            "{}/messages/conversations/{}/read",
            self.api_base_url, conversation_id
        );

        debug!(
            "[Gateway] 📡 标记会话已读: conversationId={}, 操作ID: {}",
            conversation_id, operation_id
        );

        let response = self
            .client
            .put(&url)
            .header("Authorization", auth)
            .header("operationID", &operation_id)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("请求失败: {}", e)))?;

        // 响应体内容不关心，只看状态分类
        let result = handle_json_response::<serde_json::Value>(response, "标记已读")
            .await
            .map(|_| ());
        self.observe(result)
    }
}
