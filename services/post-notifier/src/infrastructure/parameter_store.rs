//! SSM Parameter Store操作モジュール
//!
//! FCMサービスアカウントのようなSecureStringパラメータを復号して取得する。

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::Client as SsmClient;
use thiserror::Error;
use tracing::{info, warn};

/// Parameter Store操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterStoreError {
    /// AWS SDK エラー
    #[error("AWS SSM APIエラー: {0}")]
    AwsSdkError(String),
    /// パラメータに値が含まれていない
    #[error("パラメータの値がありません: {0}")]
    MissingValue(String),
}

/// Parameter Store操作トレイト（テスト用の抽象化）
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// SecureStringパラメータを復号して取得する
    ///
    /// # 引数
    /// * `name` - パラメータ名
    ///
    /// # 戻り値
    /// * `Ok(String)` - 復号済みの値
    /// * `Err(ParameterStoreError)` - エラー
    async fn get_secure_parameter(&self, name: &str) -> Result<String, ParameterStoreError>;
}

/// 実際のAWS SSM SDKを使用したParameter Store実装
pub struct AwsSsmParameterStore {
    client: SsmClient,
}

impl AwsSsmParameterStore {
    /// 新しいAwsSsmParameterStoreを作成
    pub fn new(client: SsmClient) -> Self {
        Self { client }
    }

    /// 読み込み済みのAWS設定からクライアントを作成
    pub fn from_config(sdk_config: &SdkConfig) -> Self {
        Self::new(SsmClient::new(sdk_config))
    }
}

#[async_trait]
impl ParameterStore for AwsSsmParameterStore {
    async fn get_secure_parameter(&self, name: &str) -> Result<String, ParameterStoreError> {
        let result = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await;

        match result {
            Ok(response) => {
                let value = response
                    .parameter()
                    .and_then(|p| p.value())
                    .ok_or_else(|| ParameterStoreError::MissingValue(name.to_string()))?;

                // 値そのものはログに出さない
                info!(parameter_name = %name, "SSMパラメータを取得");

                Ok(value.to_string())
            }
            Err(err) => {
                warn!(
                    parameter_name = %name,
                    error = %err,
                    "GetParameterエラー"
                );
                Err(ParameterStoreError::AwsSdkError(
                    err.into_service_error().to_string(),
                ))
            }
        }
    }
}
