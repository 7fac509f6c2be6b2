//! LinDB 写入接口使用的 flat metrics 行格式。Schema 见 `flat_metrics.fbs`

pub mod flat_metrics;
