// ==========================================
// 工单排程校验服务 - 种子数据导入器
// ==========================================
// 职责: 从 JSON 种子文件整批替换工单/工序
// 流程: 解析 → 平移 → 校验 → 规则体检(仅告警) → 单事务落库
// ==========================================

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::timestamp::{is_storable, normalize, to_utc_z};
use crate::domain::work_order::{Operation, WorkOrder};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::WorkOrderRepository;

// ==========================================
// 种子文件记录
// ==========================================

/// 种子工单记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedWorkOrder {
    pub id: String,
    pub product: String,
    pub qty: i64,
    #[serde(default)]
    pub operations: Vec<SeedOperation>,
}

/// 种子工序记录（时间为原始字符串，导入时统一规范化）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOperation {
    pub id: String,
    pub work_order_id: String,
    pub index: i64,
    pub machine_id: String,
    pub name: String,
    pub start: String,
    pub end: String,
}

// ==========================================
// ImportReport - 导入结果
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub work_orders: usize,     // 写入工单数
    pub operations: usize,      // 写入工序数
    pub shift_hours: i64,       // 实际平移小时数
    pub warnings: Vec<String>,  // 先后顺序/机台独占的违规提示
    pub elapsed_ms: u128,       // 导入耗时
}

// ==========================================
// SeedImporter - 种子导入器
// ==========================================
pub struct SeedImporter {
    work_order_repo: Arc<WorkOrderRepository>,
    shift_hours: i64,
}

impl SeedImporter {
    pub fn new(work_order_repo: Arc<WorkOrderRepository>) -> Self {
        Self {
            work_order_repo,
            shift_hours: 0,
        }
    }

    /// 设置整体时间平移（小时，可为负）
    pub fn with_shift_hours(mut self, shift_hours: i64) -> Self {
        self.shift_hours = shift_hours;
        self
    }

    /// 从 JSON 文件导入
    pub fn import_file<P: AsRef<Path>>(&self, path: P) -> ImportResult<ImportReport> {
        let path = path.as_ref();
        info!(path = %path.display(), "读取种子文件");
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ImportError::FileReadError(format!("{}: {}", path.display(), e)))?;
        self.import_str(&content)
    }

    /// 从 JSON 文本导入
    pub fn import_str(&self, content: &str) -> ImportResult<ImportReport> {
        let records: Vec<SeedWorkOrder> =
            serde_json::from_str(content).map_err(|e| ImportError::JsonParseError(e.to_string()))?;
        self.import_records(&records)
    }

    /// 校验并整批替换
    ///
    /// 任一记录校验失败时不会触碰数据库。
    pub fn import_records(&self, records: &[SeedWorkOrder]) -> ImportResult<ImportReport> {
        let started = Instant::now();
        info!(
            work_orders = records.len(),
            shift_hours = self.shift_hours,
            "开始导入种子数据"
        );

        let batch = records
            .iter()
            .map(|record| self.build_work_order(record))
            .collect::<ImportResult<Vec<_>>>()?;

        let warnings = audit_schedule(&batch);
        for message in &warnings {
            warn!("{}", message);
        }

        let (work_orders, operations) = self.work_order_repo.replace_all(&batch)?;

        let report = ImportReport {
            work_orders,
            operations,
            shift_hours: self.shift_hours,
            warnings,
            elapsed_ms: started.elapsed().as_millis(),
        };
        info!(
            work_orders = report.work_orders,
            operations = report.operations,
            warnings = report.warnings.len(),
            elapsed_ms = report.elapsed_ms as u64,
            "种子数据导入完成"
        );
        Ok(report)
    }

    fn build_work_order(&self, record: &SeedWorkOrder) -> ImportResult<(WorkOrder, Vec<Operation>)> {
        if record.qty <= 0 {
            return Err(ImportError::InvalidQuantity {
                work_order_id: record.id.clone(),
                qty: record.qty,
            });
        }

        let operations = record
            .operations
            .iter()
            .map(|op| self.build_operation(&record.id, op))
            .collect::<ImportResult<Vec<_>>>()?;

        let work_order = WorkOrder {
            id: record.id.clone(),
            product: record.product.clone(),
            qty: record.qty,
        };
        Ok((work_order, operations))
    }

    fn build_operation(&self, work_order_id: &str, op: &SeedOperation) -> ImportResult<Operation> {
        if op.work_order_id != work_order_id {
            return Err(ImportError::WorkOrderMismatch {
                operation_id: op.id.clone(),
                expected: work_order_id.to_string(),
                actual: op.work_order_id.clone(),
            });
        }

        let operation = Operation {
            id: op.id.clone(),
            work_order_id: op.work_order_id.clone(),
            index: op.index,
            machine_id: op.machine_id.clone(),
            name: op.name.clone(),
            start: self.shifted(&op.id, "start", &op.start)?,
            end: self.shifted(&op.id, "end", &op.end)?,
        };
        if !operation.has_valid_window() {
            return Err(ImportError::InvalidWindow {
                operation_id: operation.id,
            });
        }

        Ok(operation)
    }

    fn shifted(
        &self,
        operation_id: &str,
        field: &'static str,
        raw: &str,
    ) -> ImportResult<DateTime<Utc>> {
        let instant = normalize(raw).map_err(|e| ImportError::InvalidTimestamp {
            operation_id: operation_id.to_string(),
            field,
            value: e.to_string(),
        })?;

        TimeDelta::try_hours(self.shift_hours)
            .and_then(|delta| instant.checked_add_signed(delta))
            .filter(is_storable)
            .ok_or_else(|| ImportError::ShiftOverflow {
                operation_id: operation_id.to_string(),
                shift_hours: self.shift_hours,
            })
    }
}

/// 对待写入数据做先后顺序与机台独占体检，返回告警文本
fn audit_schedule(batch: &[(WorkOrder, Vec<Operation>)]) -> Vec<String> {
    let mut warnings = Vec::new();

    // 先后顺序: 同一工单内按 index 排序，前序 end 不得晚于后序 start
    for (work_order, operations) in batch {
        let mut ordered: Vec<&Operation> = operations.iter().collect();
        ordered.sort_by_key(|op| op.index);
        for pair in ordered.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if prev.end > next.start {
                warnings.push(format!(
                    "工单 {} 先后顺序冲突: 工序 {} 结束于 {}，晚于工序 {} 开始 {}",
                    work_order.id,
                    prev.id,
                    to_utc_z(&prev.end),
                    next.id,
                    to_utc_z(&next.start)
                ));
            }
        }
    }

    // 机台独占: 按机台分组后按开始时间扫描
    let mut by_machine: HashMap<&str, Vec<&Operation>> = HashMap::new();
    for (_, operations) in batch {
        for op in operations {
            by_machine.entry(op.machine_id.as_str()).or_default().push(op);
        }
    }
    let mut machines: Vec<&str> = by_machine.keys().copied().collect();
    machines.sort_unstable();

    for machine_id in machines {
        let Some(ops) = by_machine.get_mut(machine_id) else {
            continue;
        };
        ops.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

        let mut latest: Option<&Operation> = None;
        for &op in ops.iter() {
            if let Some(holder) = latest {
                if op.overlaps(&holder.start, &holder.end) {
                    warnings.push(format!(
                        "机台 {} 占用冲突: 工序 {} 与工序 {} 时间重叠",
                        machine_id, op.id, holder.id
                    ));
                }
                if op.end > holder.end {
                    latest = Some(op);
                }
            } else {
                latest = Some(op);
            }
        }
    }

    warnings
}
