use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::ucme::types::{handle_json_response, ApiError, UserProfile};

/// 登录请求（邮箱 + 邮件验证码）
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(rename = "verificationCode")]
    pub verification_code: String,
}

/// 登录响应：服务端只返回 token，当前用户资料需另行拉取
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "tokenType")]
    pub token_type: String,
}

/// 验证码发送响应
#[derive(Debug, Deserialize)]
pub struct VerificationResponse {
    pub message: String,
    #[serde(default)]
    pub verified: bool,
}

/// 请求向校园邮箱发送登录验证码
pub async fn request_login_code(
    api_base_url: &str,
    email: &str,
) -> Result<VerificationResponse, ApiError> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/auth/login/sendVerification", api_base_url);

    info!("[Auth] 📡 请求发送登录验证码");
    debug!("[Auth]   URL: {}", url);
    debug!("[Auth]   邮箱: {}", email);
    debug!("[Auth]   操作ID: {}", operation_id);

    let response = client
        .post(&url)
        .query(&[("email", email)])
        .header("operationID", &operation_id)
        .send()
        .await
        .map_err(|e| ApiError::Network(format!("请求失败: {}", e)))?;

    handle_json_response(response, "发送登录验证码").await
}

/// 使用邮箱验证码登录，返回 token
pub async fn login_async(
    api_base_url: &str,
    email: String,
    verification_code: String,
) -> Result<TokenResponse, ApiError> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/auth/login", api_base_url);

    let login_req = LoginRequest {
        email,
        verification_code,
    };

    info!("[Auth] 🔐 正在登录...");
    debug!("[Auth]   URL: {}", url);
    debug!("[Auth]   邮箱: {}", login_req.email);
    debug!("[Auth]   操作ID: {}", operation_id);

    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("operationID", &operation_id)
        .json(&login_req)
        .send()
        .await
        .map_err(|e| ApiError::Network(format!("请求失败: {}", e)))?;

    let token: TokenResponse = handle_json_response(response, "登录").await?;
    info!("[Auth] ✅ 登录成功，tokenType: {}", token.token_type);
    Ok(token)
}

/// 拉取当前用户资料
///
/// 登录接口不返回用户信息，需要带 token 调用 `/profile/me` 才能拿到用户 ID
pub async fn fetch_my_profile(api_base_url: &str, token: &str) -> Result<UserProfile, ApiError> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/profile/me", api_base_url);

    debug!("[Auth] 📡 拉取当前用户资料，操作ID: {}", operation_id);

    let response = client
        .get(&url)
        .header("Authorization", format!("Bearer {}", token))
        .header("operationID", &operation_id)
        .send()
        .await
        .map_err(|e| ApiError::Network(format!("请求失败: {}", e)))?;

    let profile: UserProfile = handle_json_response(response, "当前用户资料").await?;
    info!(
        "[Auth] ✅ 当前用户: {} (ID: {})",
        profile.name, profile.id
    );
    Ok(profile)
}
