use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// 远端调用失败分类
///
/// 网关所有操作统一返回此类型，调用方根据分类决定重试/放弃策略：
/// - `Unauthorized`：登录态失效，由 SessionContext 统一处理，不重试
/// - `Network` / `Server`：瞬时故障，可由调用方提供重试入口，但网关自身从不重试
/// - `Validation`：调用方参数错误，发出请求前即可拦截
/// - `NotFound`：目标实体已不存在（例如候选人已下线）
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// token 缺失或被服务端拒绝
    #[error("未授权或登录态已失效")]
    Unauthorized,
    /// 目标资源不存在
    #[error("目标不存在: {0}")]
    NotFound(String),
    /// 网络层错误（连接失败、超时等）
    #[error("网络错误: {0}")]
    Network(String),
    /// 服务器端错误（5xx 或响应不符合约定）
    #[error("服务器错误 {status}: {detail}")]
    Server { status: u16, detail: String },
    /// 请求校验失败（400/422，或本地拦截的非法输入）
    #[error("请求校验失败: {0}")]
    Validation(String),
    /// 组件当前状态不允许该操作（例如决策尚未完成时重复滑动）
    #[error("当前状态不允许该操作: {0}")]
    InvalidState(String),
}

impl ApiError {
    /// 是否属于可向用户提供"重试"入口的瞬时故障
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Server { .. })
    }
}

/// FastAPI 风格的错误响应体
///
/// 服务端失败时返回 `{"detail": "..."}`，detail 也可能是结构化校验信息
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: serde_json::Value,
}

/// 通用 HTTP 响应处理函数：按 HTTP 状态码分类失败，成功时反序列化 body
///
/// 所有网关操作共用此方法
pub(crate) async fn handle_json_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation_name: &str,
) -> Result<T, ApiError> {
    let status = response.status();

    // 读取 body bytes（只能读取一次）
    let body_bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::Network(format!("读取响应失败: {}", e)))?;

    if !status.is_success() {
        let detail = serde_json::from_slice::<ErrorBody>(&body_bytes)
            .map(|b| match b.detail {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            })
            .unwrap_or_else(|_| String::from_utf8_lossy(&body_bytes).into_owned());
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, detail: {}",
            operation_name, status, detail
        );
        return Err(match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(detail),
            400 | 422 => ApiError::Validation(detail),
            s => ApiError::Server { status: s, detail },
        });
    }
    debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, status);

    serde_json::from_slice(&body_bytes).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name,
            e,
            String::from_utf8_lossy(&body_bytes)
        );
        ApiError::Server {
            status: status.as_u16(),
            detail: format!("响应反序列化失败: {}", e),
        }
    })
}

// ========== 用户资料相关结构体 ==========

/// 资料图片
///
/// 服务端只返回 URL/路径，图片本体由图片服务托管
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileImage {
    pub id: i64,
    /// 所属用户 ID
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// 图片 URL 或相对路径
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    /// 是否为主图
    #[serde(rename = "isPrimary", default)]
    pub is_primary: bool,
    /// 上传时间
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<NaiveDateTime>,
}

/// 用户资料
///
/// 可以直接从服务端返回的 JSON 反序列化，缺失的字段使用默认值。
/// 注意服务端字段命名并不统一：大部分是 camelCase，个别是 snake_case，
/// 这里逐字段对齐，不整体 rename_all
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// 用户 ID
    pub id: i64,
    /// 校园邮箱
    #[serde(default)]
    pub email: String,
    /// 显示名
    #[serde(default)]
    pub name: String,
    /// 年龄（服务端可能不返回）
    #[serde(default)]
    pub age: Option<i32>,
    /// 所在学院
    #[serde(default)]
    pub college: String,
    /// 学校
    #[serde(default)]
    pub school: String,
    /// 年级
    #[serde(default)]
    pub year: i32,
    /// 性别（自定义文本）
    #[serde(default)]
    pub gender: String,
    /// 专业
    #[serde(default)]
    pub major: String,
    /// 注册时间（此字段服务端用 snake_case）
    #[serde(rename = "created_at", default)]
    pub created_at: Option<NaiveDateTime>,
    /// 个人简介
    #[serde(default)]
    pub bio: String,
    /// 兴趣标签
    #[serde(default)]
    pub interests: Vec<String>,
    /// 在修课程
    #[serde(default)]
    pub classes: Vec<String>,
    /// 期望关系类型
    #[serde(rename = "lookingFor", default)]
    pub looking_for: String,
    /// 是否吸烟
    #[serde(default)]
    pub smokes: bool,
    /// 是否饮酒
    #[serde(default)]
    pub drinks: bool,
    /// 人称代词（自定义文本）
    #[serde(default)]
    pub pronouns: String,
    /// 当前位置
    #[serde(default)]
    pub location: String,
    /// 家乡
    #[serde(default)]
    pub hometown: String,
    /// 资料图片列表
    #[serde(default)]
    pub images: Vec<ProfileImage>,
}

impl UserProfile {
    /// 主图优先，其次第一张图
    pub fn primary_image(&self) -> Option<&ProfileImage> {
        self.images
            .iter()
            .find(|img| img.is_primary)
            .or_else(|| self.images.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_profile_with_mixed_field_naming() {
        // 服务端 created_at 用 snake_case，lookingFor 用 camelCase
        let json = r#"{
            "id": 7,
            "email": "bruin@ucla.edu",
            "name": "Amy",
            "college": "UCLA",
            "school": "Engineering",
            "year": 3,
            "gender": "Female",
            "major": "CS",
            "created_at": "2024-09-01T12:30:00",
            "bio": "hi",
            "interests": ["climbing"],
            "classes": ["CS180"],
            "lookingFor": "Friends",
            "pronouns": "she/her",
            "location": "Westwood",
            "hometown": "SF",
            "images": [
                {"id": 1, "userId": 7, "imageUrl": "uploads/a.jpg", "isPrimary": false, "createdAt": "2024-09-01T12:31:00"},
                {"id": 2, "userId": 7, "imageUrl": "uploads/b.jpg", "isPrimary": true, "createdAt": "2024-09-01T12:32:00"}
            ]
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, 7);
        assert_eq!(profile.looking_for, "Friends");
        assert!(profile.created_at.is_some());
        // age 缺失时为 None
        assert!(profile.age.is_none());
        // 主图优先
        assert_eq!(profile.primary_image().unwrap().id, 2);
    }

    #[test]
    fn error_classification_is_retryable() {
        assert!(ApiError::Network("超时".into()).is_retryable());
        assert!(ApiError::Server {
            status: 502,
            detail: "bad gateway".into()
        }
        .is_retryable());
        assert!(!ApiError::Unauthorized.is_retryable());
        assert!(!ApiError::NotFound("gone".into()).is_retryable());
        assert!(!ApiError::Validation("empty".into()).is_retryable());
    }
}
