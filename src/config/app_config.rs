// ==========================================
// 工单排程校验服务 - 应用配置
// ==========================================
// 来源优先级: 命令行参数 > 环境变量 > 默认值（由 bin 中的 clap 解析）
// ==========================================

use std::path::PathBuf;

/// 数据库路径环境变量
pub const ENV_DB_PATH: &str = "FACTORY_GANTT_DB_PATH";

/// HTTP 监听地址环境变量
pub const ENV_LISTEN: &str = "FACTORY_GANTT_LISTEN";

/// 种子时间平移（小时）环境变量
pub const ENV_SEED_SHIFT_HOURS: &str = "SEED_SHIFT_HOURS";

/// 默认监听地址
pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";

/// 数据库文件名
const DB_FILE_NAME: &str = "factory_gantt.db";

/// 服务运行配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite 数据库文件路径
    pub db_path: String,
    /// HTTP 监听地址
    pub listen: String,
}

impl AppConfig {
    pub fn new(db_path: impl Into<String>, listen: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            listen: listen.into(),
        }
    }
}

/// 获取默认数据库路径
///
/// 1. 环境变量 `FACTORY_GANTT_DB_PATH`（非空）
/// 2. 用户数据目录下的 `factory-gantt/factory_gantt.db`
/// 3. 当前目录 `./factory_gantt.db`
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(ENV_DB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(".").join(DB_FILE_NAME);

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("factory-gantt");
        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join(DB_FILE_NAME),
            Err(e) => tracing::warn!("无法创建数据目录 {}: {}，回退到当前目录", dir.display(), e),
        }
    }

    path.to_string_lossy().to_string()
}
