/// プッシュ通知ゲートウェイ
///
/// 複数の登録トークンへ同じメッセージを送るマルチキャスト送信を抽象化する。
/// トークンごとの送信結果は返すが、呼び出し側は集計してログに残すだけで再送はしない。
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::MulticastMessage;

/// プッシュ送信のエラー型
///
/// バッチ全体が送れなかった場合のみ返す。トークン単位の失敗は`SendResult`に記録する。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PushGatewayError {
    /// 認証（アクセストークン取得）に失敗
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// リクエストの組み立てまたは送信に失敗
    #[error("Request failed: {0}")]
    RequestFailed(String),
}

/// トークン1件分の送信結果
#[derive(Debug, Clone, PartialEq)]
pub struct SendResult {
    /// 宛先トークン
    pub token: String,
    /// 成功時のメッセージID（projects/*/messages/*）
    pub message_id: Option<String>,
    /// 失敗時のエラー内容
    pub error: Option<String>,
}

impl SendResult {
    /// 成功結果を作成
    pub fn success(token: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    /// 失敗結果を作成
    pub fn failure(token: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            token: token.into(),
            message_id: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// マルチキャスト送信の結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MulticastSendResult {
    pub responses: Vec<SendResult>,
}

impl MulticastSendResult {
    pub fn new(responses: Vec<SendResult>) -> Self {
        Self { responses }
    }

    pub fn success_count(&self) -> usize {
        self.responses.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.responses.len() - self.success_count()
    }
}

/// プッシュ通知ゲートウェイトレイト
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// メッセージを全トークンへ送信
    ///
    /// # 戻り値
    /// * `Ok(MulticastSendResult)` - トークンごとの結果（一部失敗を含む）
    /// * `Err(PushGatewayError)` - バッチ全体の送信に失敗
    async fn send_multicast(
        &self,
        message: &MulticastMessage,
    ) -> Result<MulticastSendResult, PushGatewayError>;
}
