use reqwest::StatusCode;
use thiserror::Error;

/// 启动前的配置错误。出现这类错误时不会开始生成数据，也不会访问网络
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("scale cannot be zero")]
    ScaleIsZero,

    #[error("batch size cannot be zero")]
    BatchSizeIsZero,

    #[error("log interval cannot be zero")]
    LogIntervalIsZero,

    #[error("invalid interleave settings: group id {group_id} must be less than group count {num_groups}")]
    InvalidInterleave { group_id: u32, num_groups: u32 },

    #[error("invalid time range: start {start} must be before end {end}")]
    InvalidTimeRange { start: String, end: String },

    #[error("unknown use case: {0}")]
    UnknownUseCase(String),

    #[error("unknown tag error policy: {0}")]
    UnknownTagErrorPolicy(String),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    ReqwestError(#[from] reqwest::Error),

    /// 字段值表中的某一行不能被解析
    #[error("malformed field table at line {line}: {message}")]
    FieldTable { line: usize, message: String },

    /// 目标库的行格式只支持字符串类型的标签值
    #[error("unsupported value of tag {key}: {kind} tags are not supported by the flat metrics format")]
    UnsupportedTagValue { key: String, kind: &'static str },

    #[error("compress batch failed: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Decode flat metrics row failed: {0}")]
    FlatBufferDecode(#[from] flatbuffers::InvalidFlatbuffer),

    #[error("Decode flat metrics row failed: {0}")]
    RowDecode(String),

    #[error("LinDB write api response with non-successful code: {0}. response message is: {1}")]
    StatusError(StatusCode, String),

    /// 运行过程中出现的致命错误，带上丢失的批次序号以及行数
    #[error("batch #{batch} with {rows} rows lost: {source}")]
    BatchFailed {
        batch: u64,
        rows: usize,
        #[source]
        source: Box<LoadError>,
    },
}

impl LoadError {
    /// 取出被 [`LoadError::BatchFailed`] 包装的原始错误
    pub fn root(&self) -> &LoadError {
        match self {
            Self::BatchFailed { source, .. } => source.root(),
            other => other,
        }
    }
}
