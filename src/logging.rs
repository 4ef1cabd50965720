//! ログ出力の初期化
//!
//! 標準エラー出力への fmt レイヤー（プレーンまたは JSON）と、
//! 任意で日次ローテーションのファイル出力レイヤーを登録します。
//! 標準出力は実行結果の JSON のために空けておきます。

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry, fmt};

use crate::config::LoggingSettings;
use crate::error::ConfigError;

/// ログファイル名の接頭辞
const LOG_FILE_PREFIX: &str = "tracebound.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// グローバルなサブスクライバーを初期化
///
/// ファイル出力を有効にした場合は [`WorkerGuard`] を返します。
/// ガードが破棄されるとバッファがフラッシュされるため、プロセス終了まで保持してください。
///
/// # エラー
///
/// - [`ConfigError::Logging`] - サブスクライバーが既に登録されている
pub fn init(settings: &LoggingSettings) -> Result<Option<WorkerGuard>, ConfigError> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);
    layers.push(if settings.json {
        stderr.json().with_filter(settings.level).boxed()
    } else {
        stderr.with_filter(settings.level).boxed()
    });

    let guard = match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(settings.level)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry().with(layers).try_init()?;
    Ok(guard)
}
