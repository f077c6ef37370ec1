/// 新規投稿フォロワー通知 Lambda関数
///
/// posts_summaryテーブルのDynamoDB Streamsを受け取り、INSERTされた投稿ごとに
/// 著者のフォロワーへ通知レコードを書き込み、FCMでプッシュ通知を送信する。
///
/// レコード処理の失敗はログに記録するのみで、常に成功を返す。
use aws_config::BehaviorVersion;
use aws_lambda_events::event::dynamodb::Event;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use post_notifier::application::{FanOutNotifier, StreamProcessor};
use post_notifier::infrastructure::{
    init_logging, DynamoDbConfig, DynamoFollowerRepository, DynamoNotificationRepository,
    DynamoUserProfileRepository, FcmConfig, FcmPushGateway,
};
use tokio::sync::OnceCell;
use tracing::{error, info};

type DynamoStreamProcessor = StreamProcessor<
    DynamoFollowerRepository,
    DynamoNotificationRepository,
    DynamoUserProfileRepository,
    FcmPushGateway,
>;

/// StreamProcessorの静的インスタンス
///
/// Lambda warm start時にDynamoDBクライアントとFCMのアクセストークンを再利用するため、
/// 一度初期化したプロセッサーを静的に保持する。
static PROCESSOR: OnceCell<DynamoStreamProcessor> = OnceCell::const_new();

/// StreamProcessorを取得（初期化されていなければ初期化）
///
/// FCMサービスアカウントはSSMから取得するため非同期に初期化する
async fn get_processor() -> Result<&'static DynamoStreamProcessor, Error> {
    PROCESSOR
        .get_or_try_init(|| async {
            // DynamoDBとSSMで同じAWS設定を使う
            let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
            let db_config = DynamoDbConfig::from_env(&sdk_config)?;
            let fcm_config = FcmConfig::from_env_with_ssm(&sdk_config).await?;

            let follower_repo = DynamoFollowerRepository::new(
                db_config.client().clone(),
                db_config.followers_table().to_string(),
            );
            let notification_repo = DynamoNotificationRepository::new(
                db_config.client().clone(),
                db_config.notifications_table().to_string(),
            );
            let profile_repo = DynamoUserProfileRepository::new(
                db_config.client().clone(),
                db_config.users_table().to_string(),
            );
            let push_gateway = FcmPushGateway::new(fcm_config)?;

            info!(
                followers_table = db_config.followers_table(),
                notifications_table = db_config.notifications_table(),
                users_table = db_config.users_table(),
                "通知プロセッサーを初期化"
            );

            Ok::<_, Error>(StreamProcessor::new(FanOutNotifier::new(
                follower_repo,
                notification_repo,
                profile_repo,
                push_gateway,
            )))
        })
        .await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // Lambda関数を初期化して実行
    let func = service_fn(handler);
    lambda_runtime::run(func).await?;
    Ok(())
}

/// Lambda関数のメインハンドラー
///
/// # 処理フロー
/// 1. StreamProcessorを取得（初回のみ設定読み込みとクライアント生成）
/// 2. 各INSERTレコードについてフォロワー通知をファンアウト
/// 3. 処理結果をログに記録
async fn handler(event: LambdaEvent<Event>) -> Result<(), Error> {
    let event = event.payload;

    info!(
        record_count = event.records.len(),
        "DynamoDB Streamsイベントを受信"
    );

    // 設定不備のみエラーを返す（この時点では何も書き込んでいない）
    let processor = match get_processor().await {
        Ok(processor) => processor,
        Err(err) => {
            error!(error = %err, "通知プロセッサーの初期化に失敗");
            return Err(err);
        }
    };

    let result = processor.process_event(event).await;

    if result.failure_count > 0 {
        error!(
            failure_count = result.failure_count,
            "一部の投稿で通知処理に失敗（再試行なし）"
        );
    }

    Ok(())
}
