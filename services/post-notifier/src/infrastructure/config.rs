/// DynamoDB接続設定
use aws_config::SdkConfig;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use thiserror::Error;

/// DynamoDB設定のエラー型
#[derive(Debug, Error)]
pub enum DynamoDbConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// テーブル名とクライアントを持つDynamoDB設定
///
/// テーブル名は以下の環境変数で設定:
/// - FOLLOWERS_TABLE: フォロワー関係テーブル（userId + followerId）
/// - NOTIFICATIONS_TABLE: 通知テーブル（userId + notificationId）
/// - USERS_TABLE: ユーザープロフィールテーブル（userId）
#[derive(Debug, Clone)]
pub struct DynamoDbConfig {
    /// DynamoDBクライアントインスタンス
    client: DynamoDbClient,
    /// フォロワーテーブル名
    followers_table: String,
    /// 通知テーブル名
    notifications_table: String,
    /// ユーザーテーブル名
    users_table: String,
}

/// 環境変数からテーブル名を読み取る
fn table_name_from_env(key: &str) -> Result<String, DynamoDbConfigError> {
    std::env::var(key).map_err(|_| DynamoDbConfigError::MissingEnvVar(key.to_string()))
}

impl DynamoDbConfig {
    /// 読み込み済みのAWS設定と環境変数のテーブル名からDynamoDbConfigを作成
    ///
    /// AWS設定はSSMクライアントと共有するため呼び出し側で一度だけ読み込む
    pub fn from_env(sdk_config: &SdkConfig) -> Result<Self, DynamoDbConfigError> {
        let followers_table = table_name_from_env("FOLLOWERS_TABLE")?;
        let notifications_table = table_name_from_env("NOTIFICATIONS_TABLE")?;
        let users_table = table_name_from_env("USERS_TABLE")?;

        Ok(Self {
            client: DynamoDbClient::new(sdk_config),
            followers_table,
            notifications_table,
            users_table,
        })
    }

    /// DynamoDBクライアントへの参照を取得
    pub fn client(&self) -> &DynamoDbClient {
        &self.client
    }

    /// フォロワーテーブル名を取得
    pub fn followers_table(&self) -> &str {
        &self.followers_table
    }

    /// 通知テーブル名を取得
    pub fn notifications_table(&self) -> &str {
        &self.notifications_table
    }

    /// ユーザーテーブル名を取得
    pub fn users_table(&self) -> &str {
        &self.users_table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn sdk_config() -> SdkConfig {
        SdkConfig::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new("ap-northeast-1"))
            .build()
    }

    // 安全性: #[serial]で環境変数テストを直列化している
    unsafe fn set_all_tables() {
        unsafe {
            std::env::set_var("FOLLOWERS_TABLE", "my-followers");
            std::env::set_var("NOTIFICATIONS_TABLE", "my-notifications");
            std::env::set_var("USERS_TABLE", "my-users");
        }
    }

    unsafe fn cleanup() {
        unsafe {
            std::env::remove_var("FOLLOWERS_TABLE");
            std::env::remove_var("NOTIFICATIONS_TABLE");
            std::env::remove_var("USERS_TABLE");
        }
    }

    #[test]
    fn test_missing_env_var_error_display() {
        let error = DynamoDbConfigError::MissingEnvVar("TEST_VAR".to_string());
        assert_eq!(error.to_string(), "Missing environment variable: TEST_VAR");
    }

    #[test]
    #[serial]
    fn test_from_env_success() {
        unsafe {
            set_all_tables();
        }

        let config = DynamoDbConfig::from_env(&sdk_config()).unwrap();
        assert_eq!(config.followers_table(), "my-followers");
        assert_eq!(config.notifications_table(), "my-notifications");
        assert_eq!(config.users_table(), "my-users");

        unsafe {
            cleanup();
        }
    }

    #[test]
    #[serial]
    fn test_from_env_client_uses_shared_sdk_config() {
        unsafe {
            set_all_tables();
        }

        let config = DynamoDbConfig::from_env(&sdk_config()).unwrap();
        let region = config.client().config().region().map(|r| r.as_ref().to_string());
        assert_eq!(region.as_deref(), Some("ap-northeast-1"));

        unsafe {
            cleanup();
        }
    }

    #[test]
    #[serial]
    fn test_from_env_missing_followers_table() {
        unsafe {
            set_all_tables();
            std::env::remove_var("FOLLOWERS_TABLE");
        }

        match DynamoDbConfig::from_env(&sdk_config()) {
            Err(DynamoDbConfigError::MissingEnvVar(var)) => assert_eq!(var, "FOLLOWERS_TABLE"),
            Ok(_) => panic!("FOLLOWERS_TABLEが未設定なのに成功した"),
        }

        unsafe {
            cleanup();
        }
    }

    #[test]
    #[serial]
    fn test_from_env_missing_users_table() {
        unsafe {
            set_all_tables();
            std::env::remove_var("USERS_TABLE");
        }

        match DynamoDbConfig::from_env(&sdk_config()) {
            Err(DynamoDbConfigError::MissingEnvVar(var)) => assert_eq!(var, "USERS_TABLE"),
            Ok(_) => panic!("USERS_TABLEが未設定なのに成功した"),
        }

        unsafe {
            cleanup();
        }
    }
}
