/// ユーザープロフィール
///
/// usersテーブルのうち通知配信に必要な属性のみを保持する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// ユーザーID
    pub user_id: String,
    /// FCM登録トークン（未登録の場合はNone）
    pub fcm_token: Option<String>,
}

impl UserProfile {
    /// 新しいUserProfileを作成
    pub fn new(user_id: impl Into<String>, fcm_token: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            fcm_token,
        }
    }

    /// 配信に使えるトークンを取得
    ///
    /// 空文字のトークンは未登録と同じ扱い
    pub fn delivery_token(&self) -> Option<&str> {
        self.fcm_token.as_deref().filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_token_present() {
        let profile = UserProfile::new("f1", Some("tok1".to_string()));
        assert_eq!(profile.delivery_token(), Some("tok1"));
    }

    #[test]
    fn test_delivery_token_absent() {
        let profile = UserProfile::new("f2", None);
        assert_eq!(profile.delivery_token(), None);
    }

    #[test]
    fn test_delivery_token_empty_string() {
        let profile = UserProfile::new("f3", Some(String::new()));
        assert_eq!(profile.delivery_token(), None);
    }
}
