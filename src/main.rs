use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use tracebound::WorkflowService;
use tracebound::config::Settings;
use tracebound::config::settings::parse_level;
use tracebound::error::{ConfigError, ServiceError};

/// Tracebound: 監査台帳付きワークフロー実行エンジン
#[derive(Parser)]
#[command(name = "tracebound", version, about = "Agent workflow engine with an audit ledger")]
struct Cli {
    /// TOML 設定ファイル
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// ログレベル（trace/debug/info/warn/error/off）
    #[arg(long)]
    log_level: Option<String>,

    /// ログを JSON で出力
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 指示からワークフローを構築して表示（実行しない）
    Parse {
        /// 自然言語の指示
        instruction: String,
    },
    /// 指示からワークフローを構築して実行
    Execute {
        /// 自然言語の指示
        instruction: String,
    },
    /// 台帳の設定状態を表示
    Health,
    /// 適用後の設定を TOML で表示（クレデンシャルは除く）
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match tracebound::logging::init(&settings.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(client_error = e.is_client_error(), "{}", e);
            eprintln!("error: {}", e);
            if e.is_client_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// `.env` を読み込む
///
/// ファイルがなければ何もしません。それ以外の失敗は警告して続行します。
fn load_dotenv() {
    if let Some(warning) = dotenv_warning(dotenvy::dotenv()) {
        eprintln!("{}", warning);
    }
}

fn dotenv_warning(result: dotenvy::Result<PathBuf>) -> Option<String> {
    match result {
        Err(e) if !e.not_found() => Some(format!("warning: .env の読み込みに失敗しました: {}", e)),
        _ => None,
    }
}

/// 設定ファイル → 環境変数 → コマンドライン引数の順に適用
fn load_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    settings.apply_process_env();

    if let Some(level) = &cli.log_level {
        settings.logging.level = parse_level(level)?;
    }
    if cli.log_json {
        settings.logging.json = true;
    }
    Ok(settings)
}

async fn run(command: Command, settings: &Settings) -> Result<(), ServiceError> {
    let service = || WorkflowService::from_settings(settings);

    match command {
        Command::Parse { instruction } => print_json(&service()?.parse(&instruction)?),
        Command::Execute { instruction } => print_json(&service()?.execute(&instruction).await?),
        Command::Health => print_json(&service()?.health()),
        Command::Config => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ServiceError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
