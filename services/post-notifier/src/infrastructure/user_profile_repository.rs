/// ユーザープロフィールを読み取るリポジトリ
///
/// usersテーブル（パーティションキー: userId）からFCM登録トークンを取得する
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;

use super::repository_error::RepositoryError;
use crate::domain::UserProfile;

/// ユーザープロフィール取得用トレイト
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// ユーザーIDでプロフィールを取得
    ///
    /// # 戻り値
    /// * 見つかった場合は`Ok(Some(UserProfile))`
    /// * 見つからなかった場合は`Ok(None)`
    /// * 失敗時は`Err(RepositoryError)`
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, RepositoryError>;
}

/// UserProfileRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoUserProfileRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoUserProfileRepository {
    /// 新しいDynamoUserProfileRepositoryを作成
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// GetItemの結果からプロフィールを構築
    ///
    /// fcmTokenが文字列以外の場合はトークンなしとして扱う
    fn parse_profile(user_id: &str, item: &HashMap<String, AttributeValue>) -> UserProfile {
        let fcm_token = item
            .get("fcmToken")
            .and_then(|v| v.as_s().ok())
            .cloned();

        UserProfile::new(user_id, fcm_token)
    }
}

#[async_trait]
impl UserProfileRepository for DynamoUserProfileRepository {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, RepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("userId", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| RepositoryError::ReadError(e.into_service_error().to_string()))?;

        Ok(result
            .item
            .map(|item| Self::parse_profile(user_id, &item)))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // ユニットテスト用のモックUserProfileRepository
    #[derive(Debug, Clone, Default)]
    pub struct MockUserProfileRepository {
        profiles: Arc<Mutex<HashMap<String, UserProfile>>>,
        /// このユーザーの読み取りで失敗させる
        failing_user: Arc<Mutex<Option<String>>>,
        /// get呼び出し回数
        call_count: Arc<AtomicUsize>,
    }

    impl MockUserProfileRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, user_id: &str, fcm_token: Option<&str>) {
            self.profiles.lock().unwrap().insert(
                user_id.to_string(),
                UserProfile::new(user_id, fcm_token.map(str::to_string)),
            );
        }

        pub fn fail_for_user(&self, user_id: &str) {
            *self.failing_user.lock().unwrap() = Some(user_id.to_string());
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserProfileRepository for MockUserProfileRepository {
        async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, RepositoryError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if self.failing_user.lock().unwrap().as_deref() == Some(user_id) {
                return Err(RepositoryError::ReadError(format!(
                    "DynamoDB unavailable for {}",
                    user_id
                )));
            }

            Ok(self.profiles.lock().unwrap().get(user_id).cloned())
        }
    }

    // ==================== parse_profile テスト ====================

    #[test]
    fn test_parse_profile_with_token() {
        let item: HashMap<String, AttributeValue> = [
            ("userId".to_string(), AttributeValue::S("f1".to_string())),
            ("fcmToken".to_string(), AttributeValue::S("tok1".to_string())),
        ]
        .into_iter()
        .collect();

        let profile = DynamoUserProfileRepository::parse_profile("f1", &item);
        assert_eq!(profile.delivery_token(), Some("tok1"));
    }

    #[test]
    fn test_parse_profile_without_token() {
        let item: HashMap<String, AttributeValue> =
            [("userId".to_string(), AttributeValue::S("f2".to_string()))]
                .into_iter()
                .collect();

        let profile = DynamoUserProfileRepository::parse_profile("f2", &item);
        assert_eq!(profile.fcm_token, None);
    }

    #[test]
    fn test_parse_profile_non_string_token() {
        let item: HashMap<String, AttributeValue> =
            [("fcmToken".to_string(), AttributeValue::Null(true))]
                .into_iter()
                .collect();

        let profile = DynamoUserProfileRepository::parse_profile("f3", &item);
        assert_eq!(profile.delivery_token(), None);
    }
}
