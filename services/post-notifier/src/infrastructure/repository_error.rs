/// DynamoDBリポジトリ共通のエラー型
use thiserror::Error;

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// DynamoDBへの書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// DynamoDBからの読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),

    /// 保存されたアイテムの形式が不正
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        assert_eq!(
            RepositoryError::WriteError("conditional check failed".to_string()).to_string(),
            "Write error: conditional check failed"
        );
        assert_eq!(
            RepositoryError::ReadError("throttled".to_string()).to_string(),
            "Read error: throttled"
        );
        assert_eq!(
            RepositoryError::SerializationError("invalid format".to_string()).to_string(),
            "Serialization error: invalid format"
        );
    }

    #[test]
    fn test_repository_error_equality() {
        assert_eq!(
            RepositoryError::ReadError("test".to_string()),
            RepositoryError::ReadError("test".to_string())
        );
        assert_ne!(
            RepositoryError::WriteError("test".to_string()),
            RepositoryError::ReadError("test".to_string())
        );
    }
}
