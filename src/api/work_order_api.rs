// ==========================================
// 工单排程校验服务 - 工单查询 API
// ==========================================
// 职责: 只读投影（工单 + 按 index 排序的工序），以及服务器时间
// ==========================================

use chrono::{SubsecRound, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::dto::{ServerTime, WorkOrderView};
use crate::api::error::ApiResult;
use crate::domain::work_order::Operation;
use crate::repository::{OperationRepository, WorkOrderRepository};

pub struct WorkOrderApi {
    work_order_repo: Arc<WorkOrderRepository>,
    operation_repo: Arc<OperationRepository>,
}

impl WorkOrderApi {
    pub fn new(
        work_order_repo: Arc<WorkOrderRepository>,
        operation_repo: Arc<OperationRepository>,
    ) -> Self {
        Self {
            work_order_repo,
            operation_repo,
        }
    }

    /// 查询全部工单及其工序
    ///
    /// 工单按 id 升序，工序按 index 升序。
    pub fn list_work_orders(&self) -> ApiResult<Vec<WorkOrderView>> {
        let work_orders = self.work_order_repo.find_all()?;
        let operations = self.operation_repo.find_all()?;

        // find_all 已按 (work_order_id, index) 排序，分组后保持顺序
        let mut grouped: HashMap<String, Vec<Operation>> = HashMap::new();
        for operation in operations {
            grouped
                .entry(operation.work_order_id.clone())
                .or_default()
                .push(operation);
        }

        let views = work_orders
            .into_iter()
            .map(|work_order| {
                let operations = grouped.remove(&work_order.id).unwrap_or_default();
                WorkOrderView::new(work_order, operations)
            })
            .collect::<Vec<_>>();

        tracing::debug!("查询工单: {} 条", views.len());
        Ok(views)
    }

    /// 当前服务器时间（UTC，秒级）
    pub fn server_time(&self) -> ServerTime {
        ServerTime {
            now_utc: Utc::now().trunc_subsecs(0),
        }
    }
}
