// FCM（Firebase Cloud Messaging）接続設定
//
// サービスアカウントJSONはSSM Parameter StoreのSecureStringに保存し、
// コールドスタート時に一度だけ取得する。

use aws_config::SdkConfig;
use serde::Deserialize;
use thiserror::Error;

use super::parameter_store::{AwsSsmParameterStore, ParameterStore, ParameterStoreError};

/// FCM HTTP v1 APIのデフォルトベースURL
const DEFAULT_FCM_API_BASE_URL: &str = "https://fcm.googleapis.com";

/// GoogleのOAuth2トークンエンドポイント
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// FCM設定エラー
#[derive(Debug, Error)]
pub enum FcmConfigError {
    /// 必須の環境変数が設定されていない
    #[error("必須の環境変数が設定されていません: {0}")]
    MissingEnvVar(String),

    /// SSMからのサービスアカウント取得に失敗
    #[error("サービスアカウントの取得に失敗: {0}")]
    ParameterStore(#[from] ParameterStoreError),

    /// サービスアカウントJSONが不正
    #[error("サービスアカウントJSONが不正です: {0}")]
    InvalidServiceAccount(String),
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Googleサービスアカウントキー
///
/// Firebaseコンソールから発行されるJSONのうち、OAuth2トークン取得に必要な項目
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

// 秘密鍵をログに出さない
impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// FCMプッシュ送信の設定
///
/// # 環境変数
/// - `FCM_SERVICE_ACCOUNT_PARAMETER`: サービスアカウントJSONを保存したSSMパラメータ名（必須）
/// - `FCM_PROJECT_ID`: FirebaseプロジェクトID（任意、未設定ならサービスアカウントのproject_id）
#[derive(Debug, Clone)]
pub struct FcmConfig {
    project_id: String,
    service_account: ServiceAccountKey,
    api_base_url: String,
}

impl FcmConfig {
    /// 新しい設定を作成
    pub fn new(project_id: impl Into<String>, service_account: ServiceAccountKey) -> Self {
        Self {
            project_id: project_id.into(),
            service_account,
            api_base_url: DEFAULT_FCM_API_BASE_URL.to_string(),
        }
    }

    /// APIのベースURLを差し替える
    #[cfg(test)]
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    /// サービスアカウントJSONから設定を作成
    ///
    /// # 引数
    /// * `service_account_json` - サービスアカウントJSON文字列
    /// * `project_id_override` - 指定された場合はJSON内のproject_idより優先
    pub fn from_service_account_json(
        service_account_json: &str,
        project_id_override: Option<String>,
    ) -> Result<Self, FcmConfigError> {
        let service_account: ServiceAccountKey = serde_json::from_str(service_account_json)
            .map_err(|e| FcmConfigError::InvalidServiceAccount(e.to_string()))?;

        let project_id = project_id_override
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| service_account.project_id.clone());

        Ok(Self::new(project_id, service_account))
    }

    /// 環境変数と指定のParameter Storeから設定を読み込み
    pub async fn from_env_with_store<P>(store: &P) -> Result<Self, FcmConfigError>
    where
        P: ParameterStore,
    {
        let parameter_name = std::env::var("FCM_SERVICE_ACCOUNT_PARAMETER").map_err(|_| {
            FcmConfigError::MissingEnvVar("FCM_SERVICE_ACCOUNT_PARAMETER".to_string())
        })?;
        let project_id_override = std::env::var("FCM_PROJECT_ID").ok();

        let service_account_json = store.get_secure_parameter(&parameter_name).await?;

        Self::from_service_account_json(&service_account_json, project_id_override)
    }

    /// 環境変数とSSM Parameter Storeから設定を読み込み
    ///
    /// SSMクライアントは呼び出し側で読み込み済みのAWS設定から作る
    pub async fn from_env_with_ssm(sdk_config: &SdkConfig) -> Result<Self, FcmConfigError> {
        let store = AwsSsmParameterStore::from_config(sdk_config);
        Self::from_env_with_store(&store).await
    }

    /// FirebaseプロジェクトIDを取得
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// サービスアカウントを取得
    pub fn service_account(&self) -> &ServiceAccountKey {
        &self.service_account
    }

    /// messages:sendエンドポイントURLを構築
    ///
    /// # 戻り値
    /// 例: "https://fcm.googleapis.com/v1/projects/my-project/messages:send"
    pub fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.api_base_url.trim_end_matches('/'),
            self.project_id
        )
    }
}
