// Infrastructure layer modules
pub mod config;
pub mod fcm_config;
pub mod fcm_push_gateway;
pub mod follower_repository;
pub mod logging;
pub mod notification_repository;
pub mod parameter_store;
pub mod push_gateway;
pub mod repository_error;
pub mod user_profile_repository;

// Re-exports
pub use config::{DynamoDbConfig, DynamoDbConfigError};
pub use fcm_config::{FcmConfig, FcmConfigError, ServiceAccountKey};
pub use fcm_push_gateway::FcmPushGateway;
pub use follower_repository::{DynamoFollowerRepository, FollowerRepository};
pub use logging::init_logging;
pub use notification_repository::{DynamoNotificationRepository, NotificationRepository};
pub use parameter_store::{AwsSsmParameterStore, ParameterStore, ParameterStoreError};
pub use push_gateway::{MulticastSendResult, PushGateway, PushGatewayError, SendResult};
pub use repository_error::RepositoryError;
pub use user_profile_repository::{DynamoUserProfileRepository, UserProfileRepository};
