// アプリケーション層モジュール
pub mod fan_out_notifier;
pub mod stream_processor;

// 再エクスポート
pub use fan_out_notifier::{FanOutError, FanOutNotifier, FanOutOutcome};
pub use stream_processor::{
    parse_post_summary, RecordOutcome, StreamProcessResult, StreamProcessor,
};
