// ==========================================
// 工单排程校验服务 - 导入层
// ==========================================
// 职责: 外部种子数据导入,整批替换工单与工序
// 支持: JSON
// ==========================================

// 模块声明
pub mod error;
pub mod seed_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use seed_importer::{ImportReport, SeedImporter, SeedOperation, SeedWorkOrder};
