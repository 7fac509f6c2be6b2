//! 字段值表。
//!
//! 生成器写入的字段值并不是模拟器计算出来的，而是按字段名称从一张静态表中查出来的。
//! 表在启动时从内嵌的 CSV 资源加载一次，之后只读。
//!
//! 资源格式为每行 `name,value`，只有恰好两列的行才会被使用；
//! 第二列必须是一个十进制浮点数，否则加载失败。

use std::collections::HashMap;

use crate::{config::UseCase, error::LoadError, LoadResult};

const DEVOPS_FIELD_VALUES: &str = include_str!("resources/devops.csv");
const IOT_FIELD_VALUES: &str = include_str!("resources/iot.csv");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValueTable {
    values: HashMap<String, f64>,
}

impl FieldValueTable {
    /// 表中不存在的字段使用这个值
    pub const DEFAULT_VALUE: f64 = 0.0;

    /// 解析 `name,value` 格式的资源
    pub fn parse(data: &str) -> LoadResult<Self> {
        let mut values = HashMap::new();

        for (i, line) in data.lines().enumerate() {
            let columns = line.split(',').collect::<Vec<_>>();
            if columns.len() != 2 {
                continue;
            }

            let value = columns[1].trim().parse::<f64>().map_err(|e| LoadError::FieldTable {
                line: i + 1,
                message: format!("can not parse `{}` as float: {}", columns[1], e),
            })?;

            values.insert(columns[0].to_string(), value);
        }

        Ok(Self { values })
    }

    /// 加载负载类型对应的内嵌表。`cpu-only` 和 `devops` 共用一张表
    pub fn for_use_case(use_case: UseCase) -> LoadResult<Self> {
        match use_case {
            UseCase::Devops | UseCase::CpuOnly => Self::parse(DEVOPS_FIELD_VALUES),
            UseCase::Iot => Self::parse(IOT_FIELD_VALUES),
        }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (impl Into<String>, f64)>) -> Self {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// 查找字段值，没有的话返回 [`FieldValueTable::DEFAULT_VALUE`]
    pub fn value_of(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(Self::DEFAULT_VALUE)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
