// Domain layer modules
pub mod follower;
pub mod notification;
pub mod post_summary;
pub mod push_message;
pub mod user_profile;

// Re-exports
pub use follower::Follower;
pub use notification::{NewPostNotification, NotificationRecord, NotificationType};
pub use post_summary::{
    PostParseError, PostSummary, PostSummaryRecord, PostTimestamp, SummaryPayload,
};
pub use push_message::{MulticastMessage, PushNotification};
pub use user_profile::UserProfile;
