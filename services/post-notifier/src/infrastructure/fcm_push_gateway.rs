// FCM HTTP v1 APIによるプッシュ通知ゲートウェイ
//
// HTTP v1 APIにはマルチキャスト用エンドポイントがないため、
// トークンごとにmessages:sendを呼び出して結果を集める。
// OAuth2アクセストークンはサービスアカウントで署名したJWTと交換して取得し、
// Lambdaコンテナが生きている間はキャッシュして使い回す。

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::fcm_config::{FcmConfig, ServiceAccountKey};
use super::push_gateway::{MulticastSendResult, PushGateway, PushGatewayError, SendResult};
use crate::domain::MulticastMessage;

/// FCM送信に必要なOAuth2スコープ
const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// JWTアサーションの有効期間（秒）
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// 残り有効期間がこれを下回ったらアクセストークンを取り直す（秒）
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// リクエストタイムアウト（秒）
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// 接続タイムアウト（秒）
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Google OAuth2用JWTクレーム
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// トークンエンドポイントのレスポンス
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    expires_in: i64,
}

/// messages:sendのレスポンス
#[derive(Debug, Deserialize)]
struct FcmSendResponse {
    name: Option<String>,
}

/// キャッシュ中のアクセストークン
#[derive(Debug, Clone)]
struct CachedAccessToken {
    access_token: String,
    /// 失効時刻（Unix秒）
    expires_at: i64,
}

impl CachedAccessToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at > now + TOKEN_REFRESH_MARGIN_SECS
    }
}

/// FCM HTTP v1 APIを使用したPushGateway実装
pub struct FcmPushGateway {
    config: FcmConfig,
    http_client: Client,
    token_cache: Mutex<Option<CachedAccessToken>>,
}

impl FcmPushGateway {
    /// 新しいFcmPushGatewayを作成
    ///
    /// # 戻り値
    /// * `Ok(FcmPushGateway)` - 作成成功
    /// * `Err(PushGatewayError)` - HTTPクライアントの構築に失敗
    pub fn new(config: FcmConfig) -> Result<Self, PushGatewayError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| PushGatewayError::RequestFailed(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            token_cache: Mutex::new(None),
        })
    }

    /// JWTクレームを構築
    fn build_claims(account: &ServiceAccountKey, now: i64) -> JwtClaims {
        JwtClaims {
            iss: account.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: account.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    /// サービスアカウントの秘密鍵でJWTアサーションに署名（RS256）
    fn sign_assertion(account: &ServiceAccountKey, now: i64) -> Result<String, PushGatewayError> {
        let encoding_key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| {
                PushGatewayError::AuthenticationFailed(format!("秘密鍵の解析に失敗: {}", e))
            })?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = account.private_key_id.clone();

        encode(&header, &Self::build_claims(account, now), &encoding_key).map_err(|e| {
            PushGatewayError::AuthenticationFailed(format!("JWTの署名に失敗: {}", e))
        })
    }

    /// FCMに送るリクエストボディを構築
    fn build_message_body(token: &str, message: &MulticastMessage) -> Value {
        json!({
            "message": {
                "token": token,
                "notification": {
                    "title": message.notification.title,
                    "body": message.notification.body,
                },
                "data": message.data,
            }
        })
    }

    /// キャッシュが有効ならアクセストークンを返す
    fn cached_access_token(&self, now: i64) -> Option<String> {
        let cache = self
            .token_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        cache
            .as_ref()
            .filter(|cached| cached.is_fresh(now))
            .map(|cached| cached.access_token.clone())
    }

    fn store_access_token(&self, token: CachedAccessToken) {
        let mut cache = self
            .token_cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *cache = Some(token);
    }

    /// アクセストークンを取得（キャッシュ優先）
    async fn access_token(&self) -> Result<String, PushGatewayError> {
        let now = Utc::now().timestamp();
        if let Some(token) = self.cached_access_token(now) {
            return Ok(token);
        }

        let account = self.config.service_account();
        let assertion = Self::sign_assertion(account, now)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .http_client
            .post(&account.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| PushGatewayError::AuthenticationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushGatewayError::AuthenticationFailed(format!(
                "トークン取得失敗 (status: {}): {}",
                status, body
            )));
        }

        let token_response: GoogleTokenResponse = response
            .json()
            .await
            .map_err(|e| PushGatewayError::AuthenticationFailed(e.to_string()))?;

        debug!(
            expires_in = token_response.expires_in,
            "FCMアクセストークンを取得"
        );

        self.store_access_token(CachedAccessToken {
            access_token: token_response.access_token.clone(),
            expires_at: now + token_response.expires_in,
        });

        Ok(token_response.access_token)
    }

    /// 1トークン分を送信
    ///
    /// 失敗は結果として返し、後続トークンの送信は続ける
    async fn send_one(
        &self,
        url: &str,
        access_token: &str,
        token: &str,
        message: &MulticastMessage,
    ) -> SendResult {
        let response = self
            .http_client
            .post(url)
            .bearer_auth(access_token)
            .json(&Self::build_message_body(token, message))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => return SendResult::failure(token, e),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return SendResult::failure(token, format!("{}: {}", status, body));
        }

        match response.json::<FcmSendResponse>().await {
            Ok(FcmSendResponse { name: Some(name) }) => SendResult::success(token, name),
            Ok(FcmSendResponse { name: None }) => SendResult::success(token, String::new()),
            Err(e) => SendResult::failure(token, e),
        }
    }
}

#[async_trait]
impl PushGateway for FcmPushGateway {
    async fn send_multicast(
        &self,
        message: &MulticastMessage,
    ) -> Result<MulticastSendResult, PushGatewayError> {
        let access_token = self.access_token().await?;
        let url = self.config.send_url();

        let mut responses = Vec::with_capacity(message.tokens.len());
        for token in &message.tokens {
            let result = self.send_one(&url, &access_token, token, message).await;
            if let Some(error) = &result.error {
                warn!(error = %error, "FCM送信に失敗したトークンがあります");
            }
            responses.push(result);
        }

        let result = MulticastSendResult::new(responses);

        info!(
            project_id = self.config.project_id(),
            token_count = message.tokens.len(),
            success_count = result.success_count(),
            failure_count = result.failure_count(),
            "FCMマルチキャスト送信完了"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PushNotification;
    use crate::infrastructure::fcm_config::tests::service_account_json;
    use std::collections::BTreeMap;

    fn test_gateway() -> FcmPushGateway {
        let config = FcmConfig::from_service_account_json(&service_account_json(), None).unwrap();
        FcmPushGateway::new(config).unwrap()
    }

    fn test_message() -> MulticastMessage {
        let mut data = BTreeMap::new();
        data.insert("postId".to_string(), "p1".to_string());
        data.insert("summary".to_string(), r#"{"postId":"p1"}"#.to_string());

        MulticastMessage {
            tokens: vec!["tok1".to_string()],
            notification: PushNotification {
                title: "Alice published a new post".to_string(),
                body: "Hello".to_string(),
            },
            data,
        }
    }

    // ==================== build_claims テスト ====================

    #[test]
    fn test_build_claims() {
        let config = FcmConfig::from_service_account_json(&service_account_json(), None).unwrap();
        let claims = FcmPushGateway::build_claims(config.service_account(), 1_700_000_000);

        assert_eq!(claims.iss, "notifier@sample-project.iam.gserviceaccount.com");
        assert_eq!(claims.scope, FCM_SCOPE);
        assert_eq!(claims.aud, "https://oauth2.googleapis.com/token");
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_000_000 + ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn test_sign_assertion_rejects_invalid_key() {
        let config = FcmConfig::from_service_account_json(&service_account_json(), None).unwrap();
        let result = FcmPushGateway::sign_assertion(config.service_account(), 1_700_000_000);

        assert!(matches!(
            result,
            Err(PushGatewayError::AuthenticationFailed(_))
        ));
    }

    // ==================== build_message_body テスト ====================

    #[test]
    fn test_build_message_body() {
        let body = FcmPushGateway::build_message_body("tok1", &test_message());

        assert_eq!(body["message"]["token"], "tok1");
        assert_eq!(
            body["message"]["notification"]["title"],
            "Alice published a new post"
        );
        assert_eq!(body["message"]["notification"]["body"], "Hello");
        assert_eq!(body["message"]["data"]["postId"], "p1");
        assert_eq!(body["message"]["data"]["summary"], r#"{"postId":"p1"}"#);
    }

    // ==================== トークンキャッシュ テスト ====================

    #[test]
    fn test_cached_token_is_fresh() {
        let cached = CachedAccessToken {
            access_token: "ya29.token".to_string(),
            expires_at: 1_000 + 3600,
        };

        assert!(cached.is_fresh(1_000));
        assert!(!cached.is_fresh(1_000 + 3600 - TOKEN_REFRESH_MARGIN_SECS));
    }

    #[test]
    fn test_cached_access_token_roundtrip() {
        let gateway = test_gateway();
        let now = Utc::now().timestamp();

        assert!(gateway.cached_access_token(now).is_none());

        gateway.store_access_token(CachedAccessToken {
            access_token: "ya29.cached".to_string(),
            expires_at: now + 3600,
        });

        assert_eq!(
            gateway.cached_access_token(now).as_deref(),
            Some("ya29.cached")
        );
    }

    #[test]
    fn test_expired_cached_token_is_ignored() {
        let gateway = test_gateway();
        let now = Utc::now().timestamp();

        gateway.store_access_token(CachedAccessToken {
            access_token: "ya29.old".to_string(),
            expires_at: now + 10,
        });

        assert!(gateway.cached_access_token(now).is_none());
    }

    #[tokio::test]
    async fn test_send_multicast_fails_without_valid_credentials() {
        let gateway = test_gateway();

        let result = gateway.send_multicast(&test_message()).await;

        assert!(matches!(
            result,
            Err(PushGatewayError::AuthenticationFailed(_))
        ));
    }
}
