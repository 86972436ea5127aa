// ==========================================
// 工单排程校验服务 - 配置层
// ==========================================
// 职责: 运行配置（数据库路径、监听地址、种子平移）的默认值与环境变量名
// ==========================================

pub mod app_config;

// 重导出
pub use app_config::{
    get_default_db_path, AppConfig, DEFAULT_LISTEN, ENV_DB_PATH, ENV_LISTEN, ENV_SEED_SHIFT_HOURS,
};
