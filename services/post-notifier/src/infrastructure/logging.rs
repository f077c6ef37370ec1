/// ログ基盤モジュール
///
/// CloudWatch Logsで検索しやすいよう、1行1イベントのJSONで出力する。
/// イベントのフィールドはトップレベルに展開する。
use std::sync::Once;

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static INIT: Once = Once::new();

/// `RUST_LOG`があればそれを、なければ`default_level`を使うフィルタ
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// 通知Lambdaの出力形式
fn json_layer<S, W>(make_writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .flatten_event(true)
        .with_current_span(false)
        .with_writer(make_writer)
}

/// 標準出力へのJSONログを初期化する
///
/// 2回目以降の呼び出しは何もしない。
///
/// ```ignore
/// post_notifier::infrastructure::init_logging();
/// tracing::info!(post_id = "p1", "通知処理開始");
/// ```
pub fn init_logging() {
    INIT.call_once(|| {
        // 既にグローバルなサブスクライバーがあれば失敗するが無視する
        let _ = tracing_subscriber::registry()
            .with(env_filter("info"))
            .with(json_layer(std::io::stdout))
            .try_init();
    });
}
