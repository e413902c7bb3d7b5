use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, warn};

use listing_autopilot::app::{App, Outcome};
use listing_autopilot::cli::Cli;
use listing_autopilot::error::AppError;
use listing_autopilot::utils::logging;

/// 被 Ctrl-C 取消时的退出码
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志
    logging::init(cli.verbose);

    // Ctrl-C 只停止启动新物品，已开始的物品继续完成
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ 收到 Ctrl-C, 不再启动新物品");
            let _ = cancel_tx.send(true);
        }
    });

    match run(&cli, cancel_rx).await {
        Ok(outcome) if outcome.should_fail() => {
            error!("❌ {} 个物品处理失败 (--strict)", outcome.failed);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<AppError>() {
            Some(AppError::Cancelled { .. }) => {
                warn!("⚠️ {}", e);
                ExitCode::from(EXIT_CANCELLED)
            }
            Some(err) if err.is_fatal() => {
                error!("❌ 致命错误, 运行中止: {:#}", e);
                ExitCode::FAILURE
            }
            _ => {
                error!("❌ {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: &Cli, cancel: watch::Receiver<bool>) -> Result<Outcome> {
    // 加载配置并初始化应用
    let app = App::initialize(cli.command.io(), cancel)?;
    app.execute(&cli.command).await
}
