//! 数据点模拟器。
//!
//! 驱动循环只依赖 [`Simulator`] 这个接口；这里同时提供 devops、cpu-only 和 iot 三种内置实现，
//! 按时间窗口和采集间隔逐个产生数据点。

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    config::{GeneratorConfig, UseCase},
    error::ConfigError,
    model::Point,
    LoadResult,
};

mod devops;
mod iot;

pub use devops::*;
pub use iot::*;

pub trait Simulator {
    /// 是否已经没有更多的数据点
    fn finished(&self) -> bool;

    /// 产生下一个数据点。返回 `false` 表示这一次不需要写入，此时 `point` 不会被填充
    fn next(&mut self, point: &mut Point) -> bool;
}

impl<S: Simulator + ?Sized> Simulator for Box<S> {
    fn finished(&self) -> bool {
        (**self).finished()
    }

    fn next(&mut self, point: &mut Point) -> bool {
        (**self).next(point)
    }
}

/// 一个度量及其字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

/// 根据负载类型创建内置模拟器
pub fn from_config(config: &GeneratorConfig) -> LoadResult<Box<dyn Simulator + Send>> {
    let sim: Box<dyn Simulator + Send> = match config.use_case {
        UseCase::Devops => Box::new(DevopsSimulator::new(config, DEVOPS_MEASUREMENTS)?),
        UseCase::CpuOnly => Box::new(DevopsSimulator::new(config, CPU_ONLY_MEASUREMENTS)?),
        UseCase::Iot => Box::new(IotSimulator::new(config)?),
    };

    Ok(sim)
}

/// 模拟时间的推进：每个时间点上，依次为每个实体产生每个度量，然后时间前进一个间隔
#[derive(Debug, Clone)]
pub(crate) struct Schedule {
    now: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: TimeDelta,
    entities: usize,
    measurements: usize,
    entity: usize,
    measurement: usize,
    made_points: u64,
    max_points: u64,
}

/// 当前要产生的数据点的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub timestamp: DateTime<Utc>,
    pub entity: usize,
    pub measurement: usize,
}

impl Schedule {
    pub(crate) fn new(config: &GeneratorConfig, measurements: usize) -> LoadResult<Self> {
        let interval = TimeDelta::from_std(config.log_interval).map_err(|_| ConfigError::InvalidValue {
            name: "log_interval".to_string(),
            value: format!("{:?}", config.log_interval),
        })?;

        let entities = usize::try_from(config.scale).map_err(|_| ConfigError::InvalidValue {
            name: "scale".to_string(),
            value: config.scale.to_string(),
        })?;

        Ok(Self {
            now: config.time_start,
            end: config.time_end,
            interval,
            entities,
            measurements,
            entity: 0,
            measurement: 0,
            made_points: 0,
            max_points: config.limit,
        })
    }

    pub(crate) fn finished(&self) -> bool {
        (self.max_points > 0 && self.made_points >= self.max_points) || self.now >= self.end || self.entities == 0 || self.measurements == 0
    }

    /// 返回当前位置并前进一步
    pub(crate) fn advance(&mut self) -> Slot {
        let slot = Slot {
            timestamp: self.now,
            entity: self.entity,
            measurement: self.measurement,
        };

        self.made_points += 1;
        self.measurement += 1;

        if self.measurement == self.measurements {
            self.measurement = 0;
            self.entity += 1;

            if self.entity == self.entities {
                self.entity = 0;
                self.now += self.interval;
            }
        }

        slot
    }

    /// 实体（主机或车辆）的个数
    pub(crate) fn entities(&self) -> usize {
        self.entities
    }

    pub(crate) fn made_points(&self) -> u64 {
        self.made_points
    }
}
