//! 生成器配置

use std::{fmt::Display, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
use url::Url;

use crate::error::ConfigError;

/// 默认的时间窗口开始：`2023-12-13T00:00:00Z`
pub const DEFAULT_TIME_START_SECS: i64 = 1702425600;

/// 默认的时间窗口结束：`2023-12-16T00:00:00Z`
pub const DEFAULT_TIME_END_SECS: i64 = 1702684800;

/// 每批次的行数阈值。累计行数超过这个值的时候发送
pub const DEFAULT_BATCH_SIZE: usize = 100;

pub const DEFAULT_LOG_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9000";
pub const DEFAULT_DATABASE: &str = "_internal";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 10_000;

const WRITE_PATH: &str = "api/v1/write";

/// 负载类型，决定使用哪个模拟器以及哪个字段值表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UseCase {
    #[default]
    Devops,
    CpuOnly,
    Iot,
}

impl FromStr for UseCase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "devops" => Ok(Self::Devops),
            "cpu-only" => Ok(Self::CpuOnly),
            "iot" => Ok(Self::Iot),
            other => Err(ConfigError::UnknownUseCase(other.to_string())),
        }
    }
}

impl Display for UseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Devops => "devops",
            Self::CpuOnly => "cpu-only",
            Self::Iot => "iot",
        };

        write!(f, "{}", s)
    }
}

/// 遇到无法编码的标签值（非字符串）时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagErrorPolicy {
    /// 跳过这个数据点并计数，最后在汇总中体现
    #[default]
    Skip,

    /// 终止整个运行
    Abort,
}

impl FromStr for TagErrorPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(ConfigError::UnknownTagErrorPolicy(other.to_string())),
        }
    }
}

/// 写入端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// LinDB broker 地址，例如 `http://localhost:9000`
    pub endpoint: String,

    /// 写入的数据库
    pub database: String,

    /// 单次请求超时时间，毫秒。`None` 表示不超时
    pub timeout_ms: Option<u64>,

    /// 可重试错误的最大重试次数
    pub max_retries: u32,

    /// 第一次重试之前等待的时间，之后每次翻倍
    pub retry_base_delay_ms: u64,

    /// 重试等待时间的上限
    pub retry_max_delay_ms: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
        }
    }
}

impl WriterConfig {
    /// 拼出写入接口的完整地址：`{endpoint}/api/v1/write?db={database}`
    pub fn write_url(&self) -> Result<Url, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            name: "endpoint".to_string(),
            value: self.endpoint.clone(),
        };

        let base = if self.endpoint.ends_with('/') {
            self.endpoint.clone()
        } else {
            format!("{}/", self.endpoint)
        };

        let mut url = Url::parse(&base).and_then(|u| u.join(WRITE_PATH)).map_err(|_| invalid())?;

        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(invalid());
        }

        url.query_pairs_mut().append_pair("db", &self.database);

        Ok(url)
    }
}

/// 一次数据生成的完整配置。在驱动开始之前构建并校验，之后只读
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub use_case: UseCase,

    /// 规模，devops 为主机数，iot 为卡车数。不能为 0
    pub scale: u64,

    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,

    /// 随机数种子
    pub seed: u64,

    /// 模拟时间的步长
    pub log_interval: Duration,

    /// 最多生成多少个数据点，`0` 表示不限制
    pub limit: u64,

    /// 当前实例负责的交错分组
    pub interleaved_group_id: u32,

    /// 交错分组总数
    pub interleaved_num_groups: u32,

    pub batch_size: usize,
    pub tag_error_policy: TagErrorPolicy,
    pub writer: WriterConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            use_case: UseCase::Devops,
            scale: 1,
            time_start: DateTime::from_timestamp(DEFAULT_TIME_START_SECS, 0).unwrap_or_default(),
            time_end: DateTime::from_timestamp(DEFAULT_TIME_END_SECS, 0).unwrap_or_default(),
            seed: 0,
            log_interval: Duration::from_millis(DEFAULT_LOG_INTERVAL_MS),
            limit: 0,
            interleaved_group_id: 0,
            interleaved_num_groups: 1,
            batch_size: DEFAULT_BATCH_SIZE,
            tag_error_policy: TagErrorPolicy::default(),
            writer: WriterConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn new(use_case: UseCase, scale: u64) -> Self {
        Self {
            use_case,
            scale,
            ..Default::default()
        }
    }

    /// 设置时间窗口
    pub fn time_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.time_start = start;
        self.time_end = end;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn log_interval(mut self, interval: Duration) -> Self {
        self.log_interval = interval;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// 设置交错分组
    pub fn interleave(mut self, group_id: u32, num_groups: u32) -> Self {
        self.interleaved_group_id = group_id;
        self.interleaved_num_groups = num_groups;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn tag_error_policy(mut self, policy: TagErrorPolicy) -> Self {
        self.tag_error_policy = policy;
        self
    }

    pub fn writer(mut self, writer: WriterConfig) -> Self {
        self.writer = writer;
        self
    }

    /// Build config from env values. All of them are optional:
    ///
    /// - `LOADGEN_USE_CASE`: `devops`, `cpu-only` or `iot`
    /// - `LOADGEN_SCALE`
    /// - `LOADGEN_TIMESTAMP_START`, `LOADGEN_TIMESTAMP_END`: RFC 3339, e.g. `2023-12-13T00:00:00Z`
    /// - `LOADGEN_SEED`
    /// - `LOADGEN_LOG_INTERVAL_MS`
    /// - `LOADGEN_MAX_DATA_POINTS`
    /// - `LOADGEN_INTERLEAVED_GROUP_ID`, `LOADGEN_INTERLEAVED_NUM_GROUPS`
    /// - `LOADGEN_BATCH_SIZE`
    /// - `LOADGEN_TAG_ERROR_POLICY`: `skip` or `abort`
    /// - `LINDB_ENDPOINT`, `LINDB_DATABASE`, `LINDB_TIMEOUT_MS` (`0` disables the timeout)
    /// - `LINDB_MAX_RETRIES`, `LINDB_RETRY_BASE_DELAY_MS`, `LINDB_RETRY_MAX_DELAY_MS`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 通过给定的查找函数读取配置，然后校验
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let dw = WriterConfig::default();

        let timeout_ms = parse_var(&lookup, "LINDB_TIMEOUT_MS", dw.timeout_ms.unwrap_or(0))?;

        let config = Self {
            use_case: parse_choice(&lookup, "LOADGEN_USE_CASE", d.use_case)?,
            scale: parse_var(&lookup, "LOADGEN_SCALE", d.scale)?,
            time_start: parse_var(&lookup, "LOADGEN_TIMESTAMP_START", d.time_start)?,
            time_end: parse_var(&lookup, "LOADGEN_TIMESTAMP_END", d.time_end)?,
            seed: parse_var(&lookup, "LOADGEN_SEED", d.seed)?,
            log_interval: Duration::from_millis(parse_var(&lookup, "LOADGEN_LOG_INTERVAL_MS", DEFAULT_LOG_INTERVAL_MS)?),
            limit: parse_var(&lookup, "LOADGEN_MAX_DATA_POINTS", d.limit)?,
            interleaved_group_id: parse_var(&lookup, "LOADGEN_INTERLEAVED_GROUP_ID", d.interleaved_group_id)?,
            interleaved_num_groups: parse_var(&lookup, "LOADGEN_INTERLEAVED_NUM_GROUPS", d.interleaved_num_groups)?,
            batch_size: parse_var(&lookup, "LOADGEN_BATCH_SIZE", d.batch_size)?,
            tag_error_policy: parse_choice(&lookup, "LOADGEN_TAG_ERROR_POLICY", d.tag_error_policy)?,
            writer: WriterConfig {
                endpoint: lookup("LINDB_ENDPOINT").unwrap_or(dw.endpoint),
                database: lookup("LINDB_DATABASE").unwrap_or(dw.database),
                timeout_ms: if timeout_ms == 0 { None } else { Some(timeout_ms) },
                max_retries: parse_var(&lookup, "LINDB_MAX_RETRIES", dw.max_retries)?,
                retry_base_delay_ms: parse_var(&lookup, "LINDB_RETRY_BASE_DELAY_MS", dw.retry_base_delay_ms)?,
                retry_max_delay_ms: parse_var(&lookup, "LINDB_RETRY_MAX_DELAY_MS", dw.retry_max_delay_ms)?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// 校验配置。任何错误都在开始模拟之前返回
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scale == 0 {
            return Err(ConfigError::ScaleIsZero);
        }

        if self.batch_size == 0 {
            return Err(ConfigError::BatchSizeIsZero);
        }

        if self.log_interval.is_zero() {
            return Err(ConfigError::LogIntervalIsZero);
        }

        if self.interleaved_num_groups == 0 || self.interleaved_group_id >= self.interleaved_num_groups {
            return Err(ConfigError::InvalidInterleave {
                group_id: self.interleaved_group_id,
                num_groups: self.interleaved_num_groups,
            });
        }

        if self.time_start >= self.time_end {
            return Err(ConfigError::InvalidTimeRange {
                start: self.time_start.to_rfc3339(),
                end: self.time_end.to_rfc3339(),
            });
        }

        self.writer.write_url()?;

        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(s) if !s.trim().is_empty() => s.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: s,
        }),
        _ => Ok(default),
    }
}

/// 取值是固定集合的配置项，解析错误原样返回
fn parse_choice<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = ConfigError>,
{
    match lookup(name) {
        Some(s) if !s.trim().is_empty() => s.parse::<T>(),
        _ => Ok(default),
    }
}
