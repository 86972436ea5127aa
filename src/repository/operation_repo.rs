// ==========================================
// 工单排程校验服务 - 工序数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,时间统一以 UTC `Z` 文本读写
// ==========================================

use crate::domain::timestamp::{normalize, to_utc_z};
use crate::domain::work_order::Operation;
use crate::engine::conflict_checker::ScheduleLookup;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const OPERATION_COLUMNS: &str =
    "id, work_order_id, op_index, machine_id, name, start_at, end_at";

// ==========================================
// OperationRepository - 工序仓储
// ==========================================
/// 工序仓储
/// 职责: 管理 operations 表的读写，以及按机器/时间范围的跨工单查询
pub struct OperationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OperationRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入工序
    pub fn insert(&self, operation: &Operation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_operation(&conn, operation)
    }

    /// 按主键查询
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Operation>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM operations WHERE id = ?1", OPERATION_COLUMNS);
        let operation = conn
            .query_row(&sql, params![id], map_operation_row)
            .optional()?;
        Ok(operation)
    }

    /// 查询工单下的全部工序（按 index 升序）
    pub fn find_by_work_order(&self, work_order_id: &str) -> RepositoryResult<Vec<Operation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM operations WHERE work_order_id = ?1 ORDER BY op_index ASC",
            OPERATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let operations = stmt
            .query_map(params![work_order_id], map_operation_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(operations)
    }

    /// 查询全部工序（按工单、index 排序）
    pub fn find_all(&self) -> RepositoryResult<Vec<Operation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM operations ORDER BY work_order_id ASC, op_index ASC",
            OPERATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let operations = stmt
            .query_map([], map_operation_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(operations)
    }

    /// 查询同一机器上与 [start, end) 重叠的第一条工序（排除自身）
    ///
    /// 半开区间: existing.start < end AND existing.end > start
    /// 多条命中时按 start_at、id 升序取第一条。
    pub fn find_first_overlap(
        &self,
        machine_id: &str,
        exclude_op_id: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> RepositoryResult<Option<Operation>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM operations
            WHERE machine_id = ?1
              AND id <> ?2
              AND start_at < ?3
              AND end_at > ?4
            ORDER BY start_at ASC, id ASC
            LIMIT 1
            "#,
            OPERATION_COLUMNS
        );
        let operation = conn
            .query_row(
                &sql,
                params![machine_id, exclude_op_id, to_utc_z(end), to_utc_z(start)],
                map_operation_row,
            )
            .optional()?;
        Ok(operation)
    }

    /// 更新工序时间窗（单事务，必须恰好影响一行）
    pub fn update_window(
        &self,
        id: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let affected = tx.execute(
            "UPDATE operations SET start_at = ?1, end_at = ?2 WHERE id = ?3",
            params![to_utc_z(start), to_utc_z(end), id],
        )?;

        if affected != 1 {
            // tx 在 drop 时回滚
            return Err(RepositoryError::NotFound {
                entity: "Operation".to_string(),
                id: id.to_string(),
            });
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}

impl ScheduleLookup for OperationRepository {
    fn operations_in_work_order(&self, work_order_id: &str) -> RepositoryResult<Vec<Operation>> {
        self.find_by_work_order(work_order_id)
    }

    fn first_machine_overlap(
        &self,
        machine_id: &str,
        exclude_op_id: &str,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
    ) -> RepositoryResult<Option<Operation>> {
        self.find_first_overlap(machine_id, exclude_op_id, start, end)
    }
}

// ==========================================
// 行映射与写入辅助（供种子导入在同一事务中复用）
// ==========================================

pub(crate) fn insert_operation(conn: &Connection, operation: &Operation) -> RepositoryResult<()> {
    conn.execute(
        r#"
        INSERT INTO operations (
            id, work_order_id, op_index, machine_id, name, start_at, end_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            operation.id,
            operation.work_order_id,
            operation.index,
            operation.machine_id,
            operation.name,
            to_utc_z(&operation.start),
            to_utc_z(&operation.end),
        ],
    )?;
    Ok(())
}

fn map_operation_row(row: &Row<'_>) -> SqliteResult<Operation> {
    Ok(Operation {
        id: row.get(0)?,
        work_order_id: row.get(1)?,
        index: row.get(2)?,
        machine_id: row.get(3)?,
        name: row.get(4)?,
        start: read_instant(row, 5)?,
        end: read_instant(row, 6)?,
    })
}

fn read_instant(row: &Row<'_>, idx: usize) -> SqliteResult<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    normalize(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
