// ==========================================
// 工单排程校验服务 - 种子数据导入工具
// ==========================================
// 用法: seed_db [--db-path PATH] [--seed-file seed.json] [--shift-hours N]
// 说明: 清空全部工单/工序后整批写入种子数据
// ==========================================

use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;

use factory_gantt::config::{get_default_db_path, ENV_DB_PATH, ENV_SEED_SHIFT_HOURS};
use factory_gantt::db::{migrate, open_sqlite_connection};
use factory_gantt::importer::SeedImporter;
use factory_gantt::logging;
use factory_gantt::repository::WorkOrderRepository;

#[derive(Debug, Parser)]
#[command(name = "seed_db", version, about = "导入工单/工序种子数据（覆盖现有数据）")]
struct Cli {
    /// SQLite 数据库文件路径（缺省使用用户数据目录）
    #[arg(long, env = ENV_DB_PATH)]
    db_path: Option<String>,

    /// 种子 JSON 文件
    #[arg(long, default_value = "seed.json")]
    seed_file: String,

    /// 所有时间整体平移的小时数（例如 24 表示顺延一天）
    #[arg(long, env = ENV_SEED_SHIFT_HOURS, default_value_t = 0, allow_hyphen_values = true)]
    shift_hours: i64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    let db_path = cli.db_path.unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库 {}", db_path))?;
    migrate(&conn).context("数据库 schema 初始化失败")?;

    let repo = Arc::new(WorkOrderRepository::new(Arc::new(Mutex::new(conn))));
    let report = SeedImporter::new(repo)
        .with_shift_hours(cli.shift_hours)
        .import_file(&cli.seed_file)
        .with_context(|| format!("种子导入失败: {}", cli.seed_file))?;

    println!(
        "Seed complete! work orders: {}, operations: {}, shift hours: {}",
        report.work_orders, report.operations, report.shift_hours
    );
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    Ok(())
}
