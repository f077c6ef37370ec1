/// フォロワー関係を読み取るリポジトリ
///
/// followersテーブル（パーティションキー: userId、ソートキー: followerId）から
/// 著者をフォローしているユーザーの一覧を取得する
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use tracing::debug;

use super::repository_error::RepositoryError;
use crate::domain::Follower;

/// フォロワー一覧取得用トレイト
#[async_trait]
pub trait FollowerRepository: Send + Sync {
    /// 著者のフォロワーを全件取得
    ///
    /// # 引数
    /// * `author_id` - 著者のユーザーID
    ///
    /// # 戻り値
    /// * 成功時は`Ok(Vec<Follower>)`（フォロワーがいない場合は空）
    /// * 失敗時は`Err(RepositoryError)`
    async fn list_followers(&self, author_id: &str) -> Result<Vec<Follower>, RepositoryError>;
}

/// FollowerRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoFollowerRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoFollowerRepository {
    /// 新しいDynamoFollowerRepositoryを作成
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// Queryの結果アイテムからフォロワーを取り出す
    fn parse_follower(item: &HashMap<String, AttributeValue>) -> Result<Follower, RepositoryError> {
        item.get("followerId")
            .and_then(|v| v.as_s().ok())
            .filter(|id| !id.is_empty())
            .map(|id| Follower::new(id.clone()))
            .ok_or_else(|| {
                RepositoryError::SerializationError("Missing followerId field".to_string())
            })
    }
}

#[async_trait]
impl FollowerRepository for DynamoFollowerRepository {
    async fn list_followers(&self, author_id: &str) -> Result<Vec<Follower>, RepositoryError> {
        let mut followers = Vec::new();
        let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;

        // 1MB上限で分割されるため、LastEvaluatedKeyがなくなるまで読み切る
        loop {
            let response = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("userId = :uid")
                .expression_attribute_values(":uid", AttributeValue::S(author_id.to_string()))
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await
                .map_err(|e| RepositoryError::ReadError(e.into_service_error().to_string()))?;

            for item in response.items() {
                followers.push(Self::parse_follower(item)?);
            }

            match response.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        debug!(
            author_id = author_id,
            follower_count = followers.len(),
            "フォロワー一覧を取得"
        );

        Ok(followers)
    }
}
