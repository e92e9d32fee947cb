//! 单测共用的脚本化网关与样例数据构造器
//!
//! 按 FIFO 顺序弹出预置响应，可为单个响应附加延迟来模拟在途调用

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::ucme::conversation::types::{Conversation, ConversationDetail, Message};
use crate::ucme::discover::types::{
    Candidate, DecisionOutcome, MatchEntry, SwipeDecision,
};
use crate::ucme::gateway::RemoteGateway;
use crate::ucme::types::{ApiError, UserProfile};

pub(crate) fn profile(id: i64, name: &str) -> UserProfile {
    UserProfile {
        id,
        name: name.to_string(),
        ..UserProfile::default()
    }
}

pub(crate) fn conversation(id: i64, unread: i32) -> Conversation {
    Conversation {
        id,
        user_id1: 1,
        user_id2: id + 100,
        other_user: profile(id + 100, &format!("peer-{}", id)),
        unread_count: unread,
        ..Conversation::default()
    }
}

pub(crate) fn message(id: i64, conversation_id: i64, sender_id: i64, content: &str) -> Message {
    Message {
        id,
        conversation_id,
        sender_id,
        content: content.to_string(),
        is_read: false,
        created_at: Some(chrono::Utc::now().naive_utc()),
    }
}

pub(crate) fn detail(conversation_id: i64, messages: Vec<Message>) -> ConversationDetail {
    ConversationDetail {
        summary: conversation(conversation_id, 0),
        messages,
    }
}

pub(crate) fn outcome_plain() -> DecisionOutcome {
    DecisionOutcome::default()
}

pub(crate) fn outcome_match(match_id: i64) -> DecisionOutcome {
    DecisionOutcome {
        is_like: true,
        is_match: true,
        match_id: Some(match_id),
        ..DecisionOutcome::default()
    }
}

type Scripted<T> = Mutex<VecDeque<(Duration, Result<T, ApiError>)>>;

fn pop<T>(queue: &Scripted<T>) -> (Duration, Result<T, ApiError>) {
    queue
        .lock()
        .expect("script 锁中毒")
        .pop_front()
        .unwrap_or((Duration::ZERO, Err(ApiError::Network("无脚本响应".into()))))
}

/// 脚本化网关：每类操作按预置顺序返回，并统计调用次数
pub(crate) struct ScriptedGateway {
    candidates: Scripted<Vec<Candidate>>,
    decisions: Scripted<DecisionOutcome>,
    conversations: Scripted<Vec<Conversation>>,
    details: Scripted<ConversationDetail>,
    sends: Scripted<Message>,
    mark_reads: Scripted<()>,
    decision_calls: AtomicUsize,
    conversation_calls: AtomicUsize,
    send_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self {
            candidates: Mutex::new(VecDeque::new()),
            decisions: Mutex::new(VecDeque::new()),
            conversations: Mutex::new(VecDeque::new()),
            details: Mutex::new(VecDeque::new()),
            sends: Mutex::new(VecDeque::new()),
            mark_reads: Mutex::new(VecDeque::new()),
            decision_calls: AtomicUsize::new(0),
            conversation_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn push_candidates(&self, result: Result<Vec<Candidate>, ApiError>) {
        self.candidates
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, result));
    }

    pub(crate) fn push_decision(&self, result: Result<DecisionOutcome, ApiError>) {
        self.push_decision_delayed(Duration::ZERO, result);
    }

    pub(crate) fn push_decision_delayed(
        &self,
        delay: Duration,
        result: Result<DecisionOutcome, ApiError>,
    ) {
        self.decisions.lock().unwrap().push_back((delay, result));
    }

    pub(crate) fn push_conversations(&self, result: Result<Vec<Conversation>, ApiError>) {
        self.push_conversations_delayed(Duration::ZERO, result);
    }

    pub(crate) fn push_conversations_delayed(
        &self,
        delay: Duration,
        result: Result<Vec<Conversation>, ApiError>,
    ) {
        self.conversations.lock().unwrap().push_back((delay, result));
    }

    pub(crate) fn push_detail(&self, result: Result<ConversationDetail, ApiError>) {
        self.details
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, result));
    }

    pub(crate) fn push_send(&self, result: Result<Message, ApiError>) {
        self.push_send_delayed(Duration::ZERO, result);
    }

    pub(crate) fn push_send_delayed(&self, delay: Duration, result: Result<Message, ApiError>) {
        self.sends.lock().unwrap().push_back((delay, result));
    }

    pub(crate) fn push_mark_read(&self, result: Result<(), ApiError>) {
        self.mark_reads
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, result));
    }

    pub(crate) fn decision_calls(&self) -> usize {
        self.decision_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn conversation_calls(&self) -> usize {
        self.conversation_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteGateway for ScriptedGateway {
    async fn fetch_candidates(&self) -> Result<Vec<Candidate>, ApiError> {
        let (delay, result) = pop(&self.candidates);
        tokio::time::sleep(delay).await;
        result
    }

    async fn record_decision(&self, _decision: &SwipeDecision) -> Result<DecisionOutcome, ApiError> {
        self.decision_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, result) = pop(&self.decisions);
        tokio::time::sleep(delay).await;
        result
    }

    async fn fetch_matches(&self) -> Result<Vec<MatchEntry>, ApiError> {
        Err(ApiError::Network("无脚本响应".into()))
    }

    async fn fetch_conversations(
        &self,
        _skip: u32,
        _limit: u32,
    ) -> Result<Vec<Conversation>, ApiError> {
        self.conversation_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, result) = pop(&self.conversations);
        tokio::time::sleep(delay).await;
        result
    }

    async fn fetch_conversation(
        &self,
        _conversation_id: i64,
    ) -> Result<ConversationDetail, ApiError> {
        let (delay, result) = pop(&self.details);
        tokio::time::sleep(delay).await;
        result
    }

    async fn send_message(&self, _conversation_id: i64, _content: &str) -> Result<Message, ApiError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, result) = pop(&self.sends);
        tokio::time::sleep(delay).await;
        result
    }

    async fn mark_conversation_read(&self, _conversation_id: i64) -> Result<(), ApiError> {
        let (delay, result) = pop(&self.mark_reads);
        tokio::time::sleep(delay).await;
        result
    }
}
