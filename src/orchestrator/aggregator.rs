//! 结果汇总
//!
//! 把分发器的结果和对应的工作单元（分块序号、主键、分片号）配对，
//! 让调用方能看出哪个单元失败了

use std::fmt;

use crate::error::{DetaError, Result};

/// 单个工作单元的结果
#[derive(Debug)]
pub struct UnitResult<K, T> {
    pub unit: K,
    pub outcome: Result<T>,
}

impl<K, T> UnitResult<K, T> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&DetaError> {
        self.outcome.as_ref().err()
    }
}

/// 批量写入的分块信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
    /// 分块序号（从 0 开始，即提交顺序）
    pub index: usize,
    /// 分块内的条目数
    pub len: usize,
}

impl fmt::Display for ChunkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[分块 #{} 共 {} 条]", self.index, self.len)
    }
}

/// 一次扇出操作的全部结果，顺序与提交顺序一致
#[derive(Debug)]
pub struct BatchResult<K, T> {
    results: Vec<UnitResult<K, T>>,
}

impl<K, T> BatchResult<K, T> {
    /// 按位置把单元和结果配对
    ///
    /// `units` 与 `outcomes` 必须等长且顺序一致（分发器保证）。
    pub fn zip(units: Vec<K>, outcomes: Vec<Result<T>>) -> Self {
        debug_assert_eq!(units.len(), outcomes.len());
        let results = units
            .into_iter()
            .zip(outcomes)
            .map(|(unit, outcome)| UnitResult { unit, outcome })
            .collect();
        Self { results }
    }

    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UnitResult<K, T>> {
        self.results.iter()
    }

    /// 失败的单元
    pub fn failures(&self) -> impl Iterator<Item = &UnitResult<K, T>> {
        self.results.iter().filter(|r| !r.is_ok())
    }

    /// 成功的单元及其结果
    pub fn successes(&self) -> impl Iterator<Item = (&K, &T)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().map(|value| (&r.unit, value)))
    }

    /// 是否全部成功
    pub fn is_all_ok(&self) -> bool {
        self.results.iter().all(UnitResult::is_ok)
    }

    pub fn into_results(self) -> Vec<UnitResult<K, T>> {
        self.results
    }
}

impl<K, T> IntoIterator for BatchResult<K, T> {
    type Item = UnitResult<K, T>;
    type IntoIter = std::vec::IntoIter<UnitResult<K, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a, K, T> IntoIterator for &'a BatchResult<K, T> {
    type Item = &'a UnitResult<K, T>;
    type IntoIter = std::slice::Iter<'a, UnitResult<K, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
