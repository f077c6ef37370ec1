// StreamProcessor - posts_summaryストリームからフォロワー通知へのディスパッチ
//
// DynamoDB Streamsイベントを受け取り、INSERTレコードごとに投稿サマリーを解釈して
// FanOutNotifierに渡す。レコード単位の失敗はログに残して次のレコードへ進む。

use aws_lambda_events::event::dynamodb::{Event, EventRecord};
use serde_dynamo::AttributeValue;
use tracing::{debug, error, info, warn};

use super::fan_out_notifier::{FanOutError, FanOutNotifier, FanOutOutcome};
use crate::domain::{PostParseError, PostSummary, PostSummaryRecord};
use crate::infrastructure::{
    FollowerRepository, NotificationRepository, PushGateway, UserProfileRepository,
};

/// ストリームイベント全体の処理結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamProcessResult {
    /// プッシュ送信まで完了したレコード数
    pub dispatched_count: usize,
    /// 通知は保存したが送信先がなかったレコード数
    pub no_token_count: usize,
    /// フォロワーがいなかったレコード数
    pub no_follower_count: usize,
    /// ペイロードが欠けていたレコード数
    pub missing_payload_count: usize,
    /// INSERT以外でスキップしたレコード数
    pub skip_count: usize,
    /// ファンアウト途中で失敗したレコード数
    pub failure_count: usize,
}

impl StreamProcessResult {
    pub fn new() -> Self {
        Self::default()
    }
}

/// レコード単位の処理結果
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// INSERT以外のためスキップ（イベント名を含む）
    Skipped(String),
    /// ペイロードが欠けているため何もしなかった
    MissingPayload(PostParseError),
    /// ファンアウト完了
    Completed(FanOutOutcome),
    /// ファンアウト途中で失敗
    Failed(FanOutError),
}

/// posts_summaryストリームのプロセッサー
pub struct StreamProcessor<FR, NR, UR, PG>
where
    FR: FollowerRepository,
    NR: NotificationRepository,
    UR: UserProfileRepository,
    PG: PushGateway,
{
    notifier: FanOutNotifier<FR, NR, UR, PG>,
}

impl<FR, NR, UR, PG> StreamProcessor<FR, NR, UR, PG>
where
    FR: FollowerRepository,
    NR: NotificationRepository,
    UR: UserProfileRepository,
    PG: PushGateway,
{
    pub fn new(notifier: FanOutNotifier<FR, NR, UR, PG>) -> Self {
        Self { notifier }
    }

    /// DynamoDB Streamsイベントを処理
    ///
    /// レコードは到着順に1件ずつ処理する。どのレコードが失敗しても
    /// エラーは返さず、結果の件数に反映する。
    pub async fn process_event(&self, event: Event) -> StreamProcessResult {
        let record_count = event.records.len();
        info!(record_count = record_count, "DynamoDB Streamsイベント処理開始");

        let mut result = StreamProcessResult::new();

        for record in &event.records {
            match self.process_record(record).await {
                RecordOutcome::Skipped(event_name) => {
                    debug!(event_name = %event_name, "INSERT以外のレコードをスキップ");
                    result.skip_count += 1;
                }
                RecordOutcome::MissingPayload(_) => {
                    result.missing_payload_count += 1;
                }
                RecordOutcome::Completed(FanOutOutcome::NoFollowers) => {
                    result.no_follower_count += 1;
                }
                RecordOutcome::Completed(FanOutOutcome::NoDeliveryTokens { .. }) => {
                    result.no_token_count += 1;
                }
                RecordOutcome::Completed(FanOutOutcome::Dispatched { .. }) => {
                    result.dispatched_count += 1;
                }
                RecordOutcome::Failed(_) => {
                    result.failure_count += 1;
                }
            }
        }

        info!(
            dispatched_count = result.dispatched_count,
            no_token_count = result.no_token_count,
            no_follower_count = result.no_follower_count,
            missing_payload_count = result.missing_payload_count,
            skip_count = result.skip_count,
            failure_count = result.failure_count,
            "DynamoDB Streamsイベント処理完了"
        );

        result
    }

    /// 単一レコードを処理
    pub async fn process_record(&self, record: &EventRecord) -> RecordOutcome {
        if record.event_name != "INSERT" {
            return RecordOutcome::Skipped(record.event_name.clone());
        }

        let post = match parse_post_summary(record) {
            Ok(post) => post,
            Err(e) => {
                let post_id = match record.change.keys.get("postId") {
                    Some(AttributeValue::S(id)) => id.as_str(),
                    _ => "unknown",
                };
                warn!(
                    error = %e,
                    event_id = %record.event_id,
                    "No post data found for postId: {}",
                    post_id
                );
                return RecordOutcome::MissingPayload(e);
            }
        };

        match self.notifier.fan_out(&post).await {
            Ok(outcome) => RecordOutcome::Completed(outcome),
            Err(e) => {
                error!(
                    error = %e,
                    post_id = %post.post_id,
                    notified = e.notified(),
                    "Error processing notifications"
                );
                RecordOutcome::Failed(e)
            }
        }
    }
}

/// INSERTレコードから投稿サマリーを取り出す
///
/// postIdはKeysを優先し、なければNewImageの属性を使う
pub fn parse_post_summary(record: &EventRecord) -> Result<PostSummary, PostParseError> {
    let new_image = &record.change.new_image;
    if new_image.is_empty() {
        return Err(PostParseError::EmptyPayload);
    }

    let key_post_id = match record.change.keys.get("postId") {
        Some(AttributeValue::S(id)) => Some(id.clone()),
        _ => None,
    };

    let summary: PostSummaryRecord = serde_dynamo::from_item(new_image.clone())
        .map_err(|e| PostParseError::Decode(e.to_string()))?;

    PostSummary::from_record(key_post_id, summary)
}
