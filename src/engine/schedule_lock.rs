// ==========================================
// 工单排程校验服务 - 排程通道锁
// ==========================================
// 职责: 把"校验 → 写入"串行化到机器/工单粒度
// 说明: 冲突校验是先读后写，同一机器或同一工单相邻工序的并发调整
//       若不串行化，两次调整可能各自基于旧数据通过校验后同时提交
// 约束: 多把锁按键名排序后依次获取，避免死锁
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// 通道锁错误
#[derive(Error, Debug)]
#[error("排程锁获取失败: {0}")]
pub struct LockError(String);

/// 通道锁键
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LaneKey {
    Machine(String),
    WorkOrder(String),
}

impl LaneKey {
    pub fn machine(id: &str) -> Self {
        LaneKey::Machine(id.to_string())
    }

    pub fn work_order(id: &str) -> Self {
        LaneKey::WorkOrder(id.to_string())
    }
}

// ==========================================
// ScheduleLockRegistry - 通道锁注册表
// ==========================================
/// 按通道键分配互斥锁
///
/// 注册表只增不减，条目数受机器数与工单数约束。
#[derive(Debug, Default)]
pub struct ScheduleLockRegistry {
    lanes: Mutex<HashMap<LaneKey, Arc<Mutex<()>>>>,
}

impl ScheduleLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 持有给定通道的锁执行 `f`
    ///
    /// 键会去重并排序；`f` 返回后按相反顺序释放。
    pub fn with_lanes<T, F>(&self, keys: &[LaneKey], f: F) -> Result<T, LockError>
    where
        F: FnOnce() -> T,
    {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let handles = self.handles(&keys)?;

        let mut guards = Vec::with_capacity(handles.len());
        for handle in &handles {
            guards.push(handle.lock().map_err(|e| LockError(e.to_string()))?);
        }

        let result = f();

        while let Some(guard) = guards.pop() {
            drop(guard);
        }
        Ok(result)
    }

    /// 已登记的通道数
    pub fn lane_count(&self) -> usize {
        self.lanes.lock().map(|lanes| lanes.len()).unwrap_or(0)
    }

    fn handles(&self, keys: &[LaneKey]) -> Result<Vec<Arc<Mutex<()>>>, LockError> {
        let mut lanes = self.lanes.lock().map_err(|e| LockError(e.to_string()))?;
        Ok(keys
            .iter()
            .map(|key| lanes.entry(key.clone()).or_default().clone())
            .collect())
    }
}
