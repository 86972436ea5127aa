// ==========================================
// 工单排程校验服务 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

use crate::repository::error::RepositoryError;

/// 种子导入错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    // ===== 数据质量错误 =====
    #[error("时间格式错误 (工序 {operation_id}, 字段 {field}): {value}")]
    InvalidTimestamp {
        operation_id: String,
        field: &'static str,
        value: String,
    },

    #[error("时间窗非法 (工序 {operation_id}): end 必须晚于 start")]
    InvalidWindow { operation_id: String },

    #[error("时间平移越界 (工序 {operation_id}, 平移 {shift_hours} 小时)")]
    ShiftOverflow {
        operation_id: String,
        shift_hours: i64,
    },

    #[error("数量必须为正整数 (工单 {work_order_id}): {qty}")]
    InvalidQuantity { work_order_id: String, qty: i64 },

    #[error("工单归属不一致 (工序 {operation_id}): 期望 {expected}，实际 {actual}")]
    WorkOrderMismatch {
        operation_id: String,
        expected: String,
        actual: String,
    },

    // ===== 数据库错误 =====
    #[error("写入失败: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
