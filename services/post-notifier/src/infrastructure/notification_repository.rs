/// 通知レコードを書き込むリポジトリ
///
/// notificationsテーブル（パーティションキー: userId、ソートキー: notificationId）に
/// フォロワーごとの通知を作成する。作成時刻は書き込み時に付与する。
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::Utc;

use super::repository_error::RepositoryError;
use crate::domain::{NewPostNotification, NotificationRecord};

/// 通知書き込み用トレイト
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// ユーザーの通知コレクションに新規投稿通知を追加
    ///
    /// # 引数
    /// * `user_id` - 通知を受け取るユーザー（フォロワー）のID
    /// * `notification` - 通知内容
    ///
    /// # 戻り値
    /// * 成功時は書き込み時刻を付与した`Ok(NotificationRecord)`
    /// * 失敗時は`Err(RepositoryError)`
    async fn add(
        &self,
        user_id: &str,
        notification: &NewPostNotification,
    ) -> Result<NotificationRecord, RepositoryError>;
}

/// NotificationRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoNotificationRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoNotificationRepository {
    /// 新しいDynamoNotificationRepositoryを作成
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// 通知レコードをDynamoDBの属性に変換
    fn to_attributes(record: &NotificationRecord) -> Vec<(&'static str, AttributeValue)> {
        let mut attributes = vec![
            ("userId", AttributeValue::S(record.user_id.clone())),
            (
                "notificationId",
                AttributeValue::S(record.notification_id.clone()),
            ),
            ("postId", AttributeValue::S(record.post_id.clone())),
            ("title", AttributeValue::S(record.title.clone())),
            ("authorName", AttributeValue::S(record.author_name.clone())),
            (
                "createdAt",
                AttributeValue::N(record.created_at.timestamp_millis().to_string()),
            ),
            ("isRead", AttributeValue::Bool(record.is_read)),
            (
                "type",
                AttributeValue::S(record.notification_type.as_str().to_string()),
            ),
        ];

        if let Some(preview) = &record.preview {
            attributes.push(("preview", AttributeValue::S(preview.clone())));
        }

        attributes
    }
}

#[async_trait]
impl NotificationRepository for DynamoNotificationRepository {
    async fn add(
        &self,
        user_id: &str,
        notification: &NewPostNotification,
    ) -> Result<NotificationRecord, RepositoryError> {
        let record = NotificationRecord::stamp(user_id, notification, Utc::now());

        let mut request = self.client.put_item().table_name(&self.table_name);
        for (name, value) in Self::to_attributes(&record) {
            request = request.item(name, value);
        }

        request
            .send()
            .await
            .map_err(|e| RepositoryError::WriteError(e.into_service_error().to_string()))?;

        Ok(record)
    }
}
