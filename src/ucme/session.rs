//! 登录态上下文
//!
//! 进程内唯一的凭证持有者。所有网关调用在发起时读取当前凭证，
//! 因此登出后下一次调用立即失效，组件不得私自缓存凭证副本。

use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// 登录凭证
///
/// 登录成功后创建，登出或被服务端判定失效后销毁
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// 当前用户 ID
    pub user_id: i64,
    /// Bearer token
    pub token: String,
}

/// 登录态监听器
///
/// 同步回调：登录态变化只涉及内存状态切换，不需要挂起点
pub trait SessionListener: Send + Sync {
    /// 登录成功
    fn on_login(&self, _user_id: i64) {}
    /// 主动登出
    fn on_logout(&self) {}
    /// 服务端判定登录态失效（401），由网关边界触发
    fn on_session_invalidated(&self) {}
}

/// 空实现（默认监听器）
pub struct EmptySessionListener;

impl SessionListener for EmptySessionListener {}

/// 登录态上下文
///
/// 唯一写入方；其余组件只读。凭证通过 [`SessionContext::credential`]
/// 在每次调用时取快照，快照生命周期不超过一次未完成的远端调用
pub struct SessionContext {
    credential: RwLock<Option<Credential>>,
    listener: RwLock<Arc<dyn SessionListener>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            credential: RwLock::new(None),
            listener: RwLock::new(Arc::new(EmptySessionListener)),
        }
    }

    /// 注册登录态监听器
    pub fn set_listener(&self, listener: Arc<dyn SessionListener>) {
        *self.listener.write().expect("session listener 锁中毒") = listener;
    }

    /// 写入新凭证（登录成功后调用）
    pub fn login(&self, credential: Credential) {
        let user_id = credential.user_id;
        *self.credential.write().expect("credential 锁中毒") = Some(credential);
        info!("[Session] ✅ 登录成功，用户ID: {}", user_id);
        self.current_listener().on_login(user_id);
    }

    /// 主动登出，清空凭证；幂等
    pub fn logout(&self) {
        let had = self
            .credential
            .write()
            .expect("credential 锁中毒")
            .take()
            .is_some();
        if had {
            info!("[Session] 已登出");
            self.current_listener().on_logout();
        }
    }

    /// 服务端返回 401 时由网关调用：清空凭证并通知上层重新登录；幂等
    pub fn invalidate(&self) {
        let had = self
            .credential
            .write()
            .expect("credential 锁中毒")
            .take()
            .is_some();
        if had {
            warn!("[Session] ⚠️ 登录态被服务端判定失效，已清空凭证");
            self.current_listener().on_session_invalidated();
        }
    }

    /// 当前凭证快照；未登录时为 None
    pub fn credential(&self) -> Option<Credential> {
        self.credential.read().expect("credential 锁中毒").clone()
    }

    /// 当前用户 ID；未登录时为 None
    pub fn user_id(&self) -> Option<i64> {
        self.credential
            .read()
            .expect("credential 锁中毒")
            .as_ref()
            .map(|c| c.user_id)
    }

    pub fn is_logged_in(&self) -> bool {
        self.credential.read().expect("credential 锁中毒").is_some()
    }

    fn current_listener(&self) -> Arc<dyn SessionListener> {
        self.listener.read().expect("session listener 锁中毒").clone()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        invalidated: AtomicUsize,
        logged_out: AtomicUsize,
    }

    impl SessionListener for CountingListener {
        fn on_logout(&self) {
            self.logged_out.fetch_add(1, Ordering::SeqCst);
        }
        fn on_session_invalidated(&self) {
            self.invalidated.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn login_logout_lifecycle() {
        let session = SessionContext::new();
        assert!(!session.is_logged_in());
        assert!(session.credential().is_none());

        session.login(Credential {
            user_id: 42,
            token: "tok".into(),
        });
        assert!(session.is_logged_in());
        assert_eq!(session.user_id(), Some(42));

        session.logout();
        assert!(session.credential().is_none());
    }

    #[test]
    fn invalidate_is_idempotent() {
        let session = SessionContext::new();
        let listener = Arc::new(CountingListener {
            invalidated: AtomicUsize::new(0),
            logged_out: AtomicUsize::new(0),
        });
        session.set_listener(listener.clone());

        session.login(Credential {
            user_id: 1,
            token: "tok".into(),
        });
        session.invalidate();
        session.invalidate();
        // 已空时不重复回调
        assert_eq!(listener.invalidated.load(Ordering::SeqCst), 1);
        assert_eq!(listener.logged_out.load(Ordering::SeqCst), 0);
        assert!(!session.is_logged_in());
    }
}
