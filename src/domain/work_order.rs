// ==========================================
// 工单排程校验服务 - 工单与工序领域模型
// ==========================================
// 对齐: schema v1 work_orders / operations 表
// 红线: 工序时间窗必须满足 end > start
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::timestamp::utc_z;

// ==========================================
// WorkOrder - 工单
// ==========================================
/// 工单（生产任务），拥有按 index 排序的工序序列
///
/// 删除工单会级联删除其全部工序（外键 ON DELETE CASCADE）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: String,
    pub product: String,
    pub qty: i64, // 正整数
}

// ==========================================
// Operation - 工序
// ==========================================
/// 工序：绑定一台机器和一个时间窗
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub work_order_id: String,
    pub index: i64,         // 工单内的先后顺序（唯一，可有间隔）
    pub machine_id: String, // 独占资源
    pub name: String,
    #[serde(with = "utc_z")]
    pub start: DateTime<Utc>,
    #[serde(with = "utc_z")]
    pub end: DateTime<Utc>,
}

impl Operation {
    /// 半开区间重叠判定: `self.start < end && self.end > start`
    ///
    /// 首尾相接（一个的 end 等于另一个的 start）不算重叠。
    pub fn overlaps(&self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> bool {
        self.start < *end && self.end > *start
    }

    /// 时间窗是否合法（end 严格晚于 start）
    pub fn has_valid_window(&self) -> bool {
        self.end > self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn op(start_h: u32, end_h: u32) -> Operation {
        Operation {
            id: "OP1".to_string(),
            work_order_id: "WO1".to_string(),
            index: 0,
            machine_id: "M1".to_string(),
            name: "Cut".to_string(),
            start: Utc.with_ymd_and_hms(2030, 1, 1, start_h, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2030, 1, 1, end_h, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_overlaps_is_half_open() {
        let operation = op(9, 10);
        let at = |h| Utc.with_ymd_and_hms(2030, 1, 1, h, 0, 0).unwrap();

        assert!(operation.overlaps(&at(8), &at(10)));
        assert!(operation.overlaps(&at(9), &at(11)));
        assert!(!operation.overlaps(&at(10), &at(11)));
        assert!(!operation.overlaps(&at(7), &at(9)));
    }

    #[test]
    fn test_serializes_camel_case_with_utc_z() {
        let json = serde_json::to_value(op(9, 10)).unwrap();
        assert_eq!(json["workOrderId"], "WO1");
        assert_eq!(json["machineId"], "M1");
        assert_eq!(json["start"], "2030-01-01T09:00:00Z");
        assert_eq!(json["end"], "2030-01-01T10:00:00Z");
    }
}
