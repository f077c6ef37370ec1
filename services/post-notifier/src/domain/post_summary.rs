/// 投稿サマリー
///
/// posts_summaryテーブルに作成されたレコードを型付きで表現し、
/// 通知ペイロードに載せる要約（SummaryPayload）への射影を提供する
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// 投稿サマリーの解釈エラー
///
/// いずれも「ペイロード欠損」として扱われ、フォロワー処理を行わずに終了する
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PostParseError {
    /// NewImageが空
    #[error("post summary payload is empty")]
    EmptyPayload,

    /// postIdがKeysにもNewImageにもない
    #[error("postId is missing")]
    MissingPostId,

    /// 必須フィールドが欠落または空文字
    #[error("required field is missing: {0}")]
    MissingField(&'static str),

    /// DynamoDB Itemのデシリアライズに失敗
    #[error("failed to decode post summary: {0}")]
    Decode(String),
}

/// 作成日時
///
/// 保存時の型（数値または文字列）をそのまま保持し、
/// 通知ペイロードでも同じ表現でシリアライズする
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostTimestamp {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// posts_summaryレコードの生データ
///
/// DynamoDBの属性（camelCase）をそのまま受け取る。必須チェックは`PostSummary::from_record`で行う。
/// 必須でない属性は型が想定と違っても`None`として読み、レコード全体を不正扱いにしない。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummaryRecord {
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<PostTimestamp>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_likes: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_comments: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub preview: Option<String>,
}

/// 期待した型ならSome、それ以外（NULLや別の型）はNone
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Other(IgnoredAny),
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Value(value) => Some(value),
        Lenient::Other(_) => None,
    })
}

/// 件数カウンター
///
/// 数値は整数値のときのみ、文字列は整数として解釈できるときのみ採用する
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Integer(i64),
    Float(f64),
    Text(String),
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = lenient::<D, RawCount>(deserializer)?.and_then(|raw| match raw {
        RawCount::Integer(n) => Some(n),
        RawCount::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        RawCount::Float(_) => None,
        RawCount::Text(text) => text.trim().parse().ok(),
    });
    Ok(count)
}

/// 検証済みの投稿サマリー
#[derive(Debug, Clone, PartialEq)]
pub struct PostSummary {
    /// 投稿ID
    pub post_id: String,
    /// 投稿タイトル
    pub title: String,
    /// カテゴリ
    pub category: Option<String>,
    /// 著者の表示名
    pub author_name: String,
    /// 著者のユーザーID
    pub uid: String,
    /// 投稿の作成日時
    pub created_at: Option<PostTimestamp>,
    /// いいね数（読み取るのみで下流には渡さない）
    pub num_likes: Option<i64>,
    /// コメント数（読み取るのみで下流には渡さない）
    pub num_comments: Option<i64>,
    /// 本文プレビュー
    pub preview: Option<String>,
}

impl PostSummary {
    /// 生レコードを検証してPostSummaryを構築
    ///
    /// # 引数
    /// * `post_id` - ストリームのKeysから取得した投稿ID（なければレコード内のpost_idを使う）
    /// * `record` - NewImageをデシリアライズしたレコード
    ///
    /// # 戻り値
    /// * `Ok(PostSummary)` - uid、title、author_nameが揃っている場合
    /// * `Err(PostParseError)` - 必須フィールドが欠けている場合
    pub fn from_record(
        post_id: Option<String>,
        record: PostSummaryRecord,
    ) -> Result<Self, PostParseError> {
        let post_id = non_empty(post_id)
            .or_else(|| non_empty(record.post_id.clone()))
            .ok_or(PostParseError::MissingPostId)?;

        let uid = non_empty(record.uid).ok_or(PostParseError::MissingField("uid"))?;
        let title = non_empty(record.title).ok_or(PostParseError::MissingField("title"))?;
        let author_name =
            non_empty(record.author_name).ok_or(PostParseError::MissingField("authorName"))?;

        Ok(Self {
            post_id,
            title,
            category: record.category,
            author_name,
            uid,
            created_at: record.created_at,
            num_likes: record.num_likes,
            num_comments: record.num_comments,
            preview: record.preview,
        })
    }

    /// 通知ペイロード用の要約に射影する
    ///
    /// num_likes / num_comments は含めない
    pub fn to_summary(&self) -> SummaryPayload {
        SummaryPayload {
            post_id: self.post_id.clone(),
            title: self.title.clone(),
            category: self.category.clone(),
            author_name: self.author_name.clone(),
            uid: self.uid.clone(),
            created_at: self.created_at.clone(),
            preview: self.preview.clone(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// プッシュ通知のdataに載せる投稿要約
///
/// クライアントアプリが読むため、キーはcamelCaseでシリアライズする。
/// 値のないフィールドは出力しない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPayload {
    pub post_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub author_name: String,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<PostTimestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}
