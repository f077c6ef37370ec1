/// フォロワー向け通知レコード
///
/// 投稿1件につきフォロワー1人あたり1件作成され、以降は更新・削除しない
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post_summary::PostSummary;

/// 通知種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// フォロー中の著者による新規投稿
    NewPost,
}

impl NotificationType {
    /// 保存時の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::NewPost => "new_post",
        }
    }
}

/// 書き込み前の新規投稿通知
///
/// 作成時刻は書き込み時にリポジトリが付与する
#[derive(Debug, Clone, PartialEq)]
pub struct NewPostNotification {
    pub post_id: String,
    pub title: String,
    pub author_name: String,
    pub preview: Option<String>,
}

impl NewPostNotification {
    /// 投稿サマリーから通知内容を作成
    pub fn from_post(post: &PostSummary) -> Self {
        Self {
            post_id: post.post_id.clone(),
            title: post.title.clone(),
            author_name: post.author_name.clone(),
            preview: post.preview.clone(),
        }
    }
}

/// 保存済みの通知レコード
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    /// 通知の所有者（フォロワー）のユーザーID
    pub user_id: String,
    /// ソートキー（作成時刻ミリ秒#投稿ID）
    pub notification_id: String,
    pub post_id: String,
    pub title: String,
    pub author_name: String,
    pub preview: Option<String>,
    /// 書き込み時刻（投稿のcreated_atではない）
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub notification_type: NotificationType,
}

impl NotificationRecord {
    /// 書き込み時刻を付与して未読の通知レコードを作成
    pub fn stamp(user_id: &str, notification: &NewPostNotification, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            notification_id: Self::build_notification_id(now, &notification.post_id),
            post_id: notification.post_id.clone(),
            title: notification.title.clone(),
            author_name: notification.author_name.clone(),
            preview: notification.preview.clone(),
            created_at: now,
            is_read: false,
            notification_type: NotificationType::NewPost,
        }
    }

    /// ソートキーを構築
    ///
    /// ミリ秒を13桁ゼロ埋めして、ユーザーの通知が時系列順に並ぶようにする
    pub fn build_notification_id(created_at: DateTime<Utc>, post_id: &str) -> String {
        format!("{:013}#{}", created_at.timestamp_millis(), post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_notification() -> NewPostNotification {
        NewPostNotification {
            post_id: "p1".to_string(),
            title: "Hello".to_string(),
            author_name: "Alice".to_string(),
            preview: Some("...".to_string()),
        }
    }

    #[test]
    fn test_notification_type_as_str() {
        assert_eq!(NotificationType::NewPost.as_str(), "new_post");
    }

    #[test]
    fn test_notification_type_serde() {
        let json = serde_json::to_string(&NotificationType::NewPost).unwrap();
        assert_eq!(json, r#""new_post""#);
    }

    #[test]
    fn test_stamp_sets_unread_and_type() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let record = NotificationRecord::stamp("f1", &sample_notification(), now);

        assert_eq!(record.user_id, "f1");
        assert_eq!(record.post_id, "p1");
        assert_eq!(record.created_at, now);
        assert!(!record.is_read);
        assert_eq!(record.notification_type, NotificationType::NewPost);
    }

    #[test]
    fn test_notification_id_is_sortable() {
        let early = Utc.timestamp_millis_opt(999).unwrap();
        let late = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

        let early_id = NotificationRecord::build_notification_id(early, "p1");
        let late_id = NotificationRecord::build_notification_id(late, "p1");

        assert_eq!(early_id, "0000000000999#p1");
        assert!(early_id < late_id);
    }
}
