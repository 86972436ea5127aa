// ==========================================
// 工单排程校验服务 - 工单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 删除工单依赖外键 ON DELETE CASCADE 级联删除工序
// ==========================================

use crate::domain::work_order::{Operation, WorkOrder};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::operation_repo::insert_operation;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// WorkOrderRepository - 工单仓储
// ==========================================
/// 工单仓储
/// 职责: 管理 work_orders 表的 CRUD 操作以及整批替换（种子导入）
pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
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

    /// 创建工单
    pub fn insert(&self, work_order: &WorkOrder) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_work_order(&conn, work_order)
    }

    /// 按主键查询
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<WorkOrder>> {
        let conn = self.get_conn()?;
        let work_order = conn
            .query_row(
                "SELECT id, product, qty FROM work_orders WHERE id = ?1",
                params![id],
                |row| {
                    Ok(WorkOrder {
                        id: row.get(0)?,
                        product: row.get(1)?,
                        qty: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(work_order)
    }

    /// 查询全部工单（按 id 升序）
    pub fn find_all(&self) -> RepositoryResult<Vec<WorkOrder>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, product, qty FROM work_orders ORDER BY id ASC")?;
        let work_orders = stmt
            .query_map([], |row| {
                Ok(WorkOrder {
                    id: row.get(0)?,
                    product: row.get(1)?,
                    qty: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(work_orders)
    }

    /// 删除工单（级联删除其工序）
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 工单不存在
    pub fn delete(&self, id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM work_orders WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// 整批替换：清空全部工单/工序后写入新数据（单事务）
    ///
    /// # 返回
    /// (写入工单数, 写入工序数)
    pub fn replace_all(
        &self,
        batch: &[(WorkOrder, Vec<Operation>)],
    ) -> RepositoryResult<(usize, usize)> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute("DELETE FROM operations", [])?;
        tx.execute("DELETE FROM work_orders", [])?;

        let mut operation_count = 0;
        for (work_order, operations) in batch {
            insert_work_order(&tx, work_order)?;
            for operation in operations {
                insert_operation(&tx, operation)?;
                operation_count += 1;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok((batch.len(), operation_count))
    }
}

fn insert_work_order(conn: &Connection, work_order: &WorkOrder) -> RepositoryResult<()> {
    conn.execute(
        "INSERT INTO work_orders (id, product, qty) VALUES (?1, ?2, ?3)",
        params![work_order.id, work_order.product, work_order.qty],
    )?;
    Ok(())
}
