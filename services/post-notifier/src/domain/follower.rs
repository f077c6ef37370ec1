/// フォロワー関係
///
/// 著者（user_id）をフォローしているユーザーを表す
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Follower {
    /// フォローしているユーザーのID
    pub follower_id: String,
}

impl Follower {
    pub fn new(follower_id: impl Into<String>) -> Self {
        Self {
            follower_id: follower_id.into(),
        }
    }
}
