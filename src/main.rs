// ==========================================
// 工单排程校验服务 - HTTP 主入口
// ==========================================
// 技术栈: axum + Rust + SQLite
// 配置: 命令行参数 > 环境变量 > 默认值
// ==========================================

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use factory_gantt::app::{router, AppState};
use factory_gantt::config::{get_default_db_path, AppConfig, DEFAULT_LISTEN, ENV_DB_PATH, ENV_LISTEN};
use factory_gantt::logging;

#[derive(Debug, Parser)]
#[command(name = "factory-gantt", version, about = "工单排程校验 HTTP 服务")]
struct Cli {
    /// HTTP 监听地址
    #[arg(long, env = ENV_LISTEN, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// SQLite 数据库文件路径（缺省使用用户数据目录）
    #[arg(long, env = ENV_DB_PATH)]
    db_path: Option<String>,

    /// 以 JSON 格式输出日志
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    let config = AppConfig::new(
        cli.db_path.unwrap_or_else(get_default_db_path),
        cli.listen,
    );

    tracing::info!("==================================================");
    tracing::info!("{} - 系统版本: {}", factory_gantt::APP_NAME, factory_gantt::VERSION);
    tracing::info!("==================================================");
    tracing::info!("使用数据库: {}", config.db_path);

    let state = AppState::new(&config.db_path).map_err(anyhow::Error::msg)?;
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("无法监听地址 {}", config.listen))?;
    tracing::info!("HTTP 服务已启动: http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    tracing::info!("HTTP 服务已退出");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("无法监听退出信号: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在关闭");
}
