/// 新規投稿のフォロワー通知ファンアウト
///
/// 1件の投稿サマリーから、フォロワー全員分の通知レコードと
/// 登録トークンを持つフォロワー宛ての1回のマルチキャスト送信を作り出す
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{MulticastMessage, NewPostNotification, PostSummary};
use crate::infrastructure::{
    FollowerRepository, NotificationRepository, PushGateway, PushGatewayError, RepositoryError,
    UserProfileRepository,
};

/// ファンアウトの完了結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanOutOutcome {
    /// フォロワーがいないため何も書き込まなかった
    NoFollowers,
    /// 通知は保存したが、トークンを持つフォロワーがいないため送信しなかった
    NoDeliveryTokens { notified: usize },
    /// 通知を保存し、マルチキャスト送信を1回行った
    Dispatched {
        notified: usize,
        token_count: usize,
        success_count: usize,
        failure_count: usize,
    },
}

/// ファンアウト途中の失敗
///
/// `notified`は失敗時点までに通知を書き込んだフォロワー数。
/// 書き込み済みの通知は取り消さない。
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FanOutError {
    /// フォロワー一覧の取得に失敗
    #[error("failed to list followers of {author_id}: {source}")]
    FollowerLookup {
        author_id: String,
        source: RepositoryError,
    },

    /// 通知の書き込みに失敗
    #[error("failed to write notification for {follower_id}: {source}")]
    NotificationWrite {
        follower_id: String,
        notified: usize,
        source: RepositoryError,
    },

    /// プロフィールの読み取りに失敗
    #[error("failed to read profile of {follower_id}: {source}")]
    ProfileRead {
        follower_id: String,
        notified: usize,
        source: RepositoryError,
    },

    /// プッシュ通知ペイロードのシリアライズに失敗
    #[error("failed to encode push payload: {message}")]
    PayloadEncoding { notified: usize, message: String },

    /// マルチキャスト送信に失敗
    #[error("failed to send multicast push: {source}")]
    PushSend {
        notified: usize,
        source: PushGatewayError,
    },
}

impl FanOutError {
    /// 失敗までに通知を書き込んだフォロワー数
    pub fn notified(&self) -> usize {
        match self {
            FanOutError::FollowerLookup { .. } => 0,
            FanOutError::NotificationWrite { notified, .. }
            | FanOutError::ProfileRead { notified, .. }
            | FanOutError::PayloadEncoding { notified, .. }
            | FanOutError::PushSend { notified, .. } => *notified,
        }
    }
}

/// フォロワー通知ファンアウトを実行するハンドラー
///
/// フォロワーは1人ずつ順番に処理する（通知書き込み → プロフィール読み取り）
pub struct FanOutNotifier<FR, NR, UR, PG>
where
    FR: FollowerRepository,
    NR: NotificationRepository,
    UR: UserProfileRepository,
    PG: PushGateway,
{
    follower_repo: FR,
    notification_repo: NR,
    profile_repo: UR,
    push_gateway: PG,
}

impl<FR, NR, UR, PG> FanOutNotifier<FR, NR, UR, PG>
where
    FR: FollowerRepository,
    NR: NotificationRepository,
    UR: UserProfileRepository,
    PG: PushGateway,
{
    /// 新しいFanOutNotifierを作成
    pub fn new(
        follower_repo: FR,
        notification_repo: NR,
        profile_repo: UR,
        push_gateway: PG,
    ) -> Self {
        Self {
            follower_repo,
            notification_repo,
            profile_repo,
            push_gateway,
        }
    }

    /// 投稿をフォロワーへファンアウト
    ///
    /// # 処理フロー
    /// 1. 著者のフォロワー一覧を取得（0件なら終了）
    /// 2. フォロワーごとに通知を書き込み、FCMトークンを収集
    /// 3. トークンが1件以上あればマルチキャスト送信を1回実行
    ///
    /// # 戻り値
    /// * `Ok(FanOutOutcome)` - 完了
    /// * `Err(FanOutError)` - 途中で失敗（それまでの書き込みは残る）
    pub async fn fan_out(&self, post: &PostSummary) -> Result<FanOutOutcome, FanOutError> {
        info!(
            post_id = %post.post_id,
            author_id = %post.uid,
            "New post published by {}: \"{}\" in {}",
            post.author_name,
            post.title,
            post.category.as_deref().unwrap_or("-")
        );

        let followers = self
            .follower_repo
            .list_followers(&post.uid)
            .await
            .map_err(|source| FanOutError::FollowerLookup {
                author_id: post.uid.clone(),
                source,
            })?;

        if followers.is_empty() {
            info!(author_id = %post.uid, "フォロワーがいないため通知をスキップ");
            return Ok(FanOutOutcome::NoFollowers);
        }

        let notification = NewPostNotification::from_post(post);
        let mut tokens: Vec<String> = Vec::new();
        let mut notified = 0;

        for follower in &followers {
            let follower_id = follower.follower_id.as_str();

            let record = self
                .notification_repo
                .add(follower_id, &notification)
                .await
                .map_err(|source| FanOutError::NotificationWrite {
                    follower_id: follower_id.to_string(),
                    notified,
                    source,
                })?;
            notified += 1;

            debug!(
                follower_id = follower_id,
                notification_id = %record.notification_id,
                "通知を書き込み"
            );

            let profile = self
                .profile_repo
                .get(follower_id)
                .await
                .map_err(|source| FanOutError::ProfileRead {
                    follower_id: follower_id.to_string(),
                    notified,
                    source,
                })?;

            if let Some(token) = profile.as_ref().and_then(|p| p.delivery_token()) {
                tokens.push(token.to_string());
            }
        }

        if tokens.is_empty() {
            info!(notified = notified, "No followers with FCM tokens found.");
            return Ok(FanOutOutcome::NoDeliveryTokens { notified });
        }

        let token_count = tokens.len();
        let message = MulticastMessage::new_post(post, tokens).map_err(|e| {
            FanOutError::PayloadEncoding {
                notified,
                message: e.to_string(),
            }
        })?;

        let result = self
            .push_gateway
            .send_multicast(&message)
            .await
            .map_err(|source| FanOutError::PushSend { notified, source })?;

        info!(
            post_id = %post.post_id,
            notified = notified,
            token_count = token_count,
            "Notifications stored and sent to {} followers.",
            token_count
        );

        Ok(FanOutOutcome::Dispatched {
            notified,
            token_count,
            success_count: result.success_count(),
            failure_count: result.failure_count(),
        })
    }
}
