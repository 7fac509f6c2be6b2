use chrono::{DateTime, Utc};

/// 以十六进制输出字节内容，只在 trace 级别生效
pub(crate) fn debug_bytes(bytes: &[u8]) {
    if log::log_enabled!(log::Level::Trace) {
        log::trace!("{} bytes: {}", bytes.len(), hex::encode(bytes));
    }
}

/// 格式化成 ISO8601 时间字符串，例如 `2023-12-13T00:00:00.000Z`
pub(crate) fn iso8601(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
