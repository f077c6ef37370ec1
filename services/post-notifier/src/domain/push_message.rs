/// プッシュ通知メッセージ
///
/// 新規投稿をフォロワーの端末へ知らせるマルチキャストメッセージを組み立てる
use std::collections::BTreeMap;

use serde::Serialize;

use super::post_summary::PostSummary;

/// 通知欄に表示されるタイトルと本文
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

/// 複数トークン宛てのプッシュ通知
///
/// FCMのdataは文字列→文字列のマップのみ受け付ける
#[derive(Debug, Clone, PartialEq)]
pub struct MulticastMessage {
    /// 配信先の登録トークン
    pub tokens: Vec<String>,
    pub notification: PushNotification,
    pub data: BTreeMap<String, String>,
}

impl MulticastMessage {
    /// 新規投稿のマルチキャストメッセージを作成
    ///
    /// - title: "{author_name} published a new post"
    /// - body: 投稿タイトル
    /// - data: postId と summary（SummaryPayloadのJSON文字列）
    pub fn new_post(post: &PostSummary, tokens: Vec<String>) -> Result<Self, serde_json::Error> {
        let summary = serde_json::to_string(&post.to_summary())?;

        let mut data = BTreeMap::new();
        data.insert("postId".to_string(), post.post_id.clone());
        data.insert("summary".to_string(), summary);

        Ok(Self {
            tokens,
            notification: PushNotification {
                title: format!("{} published a new post", post.author_name),
                body: post.title.clone(),
            },
            data,
        })
    }
}
