//! 数据生成的驱动循环。
//!
//! 每一轮从模拟器取一个数据点，按照交错分组判断是否属于当前实例；属于当前实例并且需要写入的点
//! 被编码追加到批次中。批次行数超过阈值时压缩并发送，发送完成之前不会继续生成。
//! 模拟器结束后把剩余的不完整批次发送一次。

use std::fmt::{self, Display};

use crate::{
    batch::{Batch, BatchAccumulator},
    compress::{Compressor, GzipCompressor},
    config::{GeneratorConfig, TagErrorPolicy},
    error::{ConfigError, LoadError},
    field_table::FieldValueTable,
    model::Point,
    row::RowEncoder,
    simulator::{self, Simulator},
    util::iso8601,
    LoadResult, Transport, WriteClient, WriteRequest,
};

/// 交错分组的游标。每产生一个数据点前进一步，在 `[0, num_groups)` 之间循环
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterleaveCursor {
    group_id: u32,
    num_groups: u32,
    position: u32,
}

impl InterleaveCursor {
    pub fn new(group_id: u32, num_groups: u32) -> Result<Self, ConfigError> {
        if num_groups == 0 || group_id >= num_groups {
            return Err(ConfigError::InvalidInterleave { group_id, num_groups });
        }

        Ok(Self {
            group_id,
            num_groups,
            position: 0,
        })
    }

    /// 当前的数据点是否属于这个实例
    pub fn is_current(&self) -> bool {
        self.position == self.group_id
    }

    pub fn advance(&mut self) {
        self.position = (self.position + 1) % self.num_groups;
    }
}

/// 一次运行的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 模拟器产生的数据点个数，包括不需要写入的
    pub points_generated: u64,

    /// 属于当前实例的数据点个数
    pub points_attributed: u64,

    /// 成功编码并进入批次的数据点个数
    pub points_written: u64,

    /// 因为标签值不被支持而跳过的数据点个数
    pub points_skipped: u64,

    pub batches_pushed: u64,
    pub rows_pushed: u64,

    /// 压缩前的字节数
    pub raw_bytes: u64,

    /// 压缩后的字节数
    pub compressed_bytes: u64,
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generated: {}, attributed: {}, written: {}, skipped: {}, batches: {}, rows: {}, raw bytes: {}, compressed bytes: {}",
            self.points_generated,
            self.points_attributed,
            self.points_written,
            self.points_skipped,
            self.batches_pushed,
            self.rows_pushed,
            self.raw_bytes,
            self.compressed_bytes
        )
    }
}

/// 驱动一个模拟器，把属于当前实例的数据点写到目标库。
///
/// 数据点、批次缓冲、编码器和压缩缓冲都由驱动独占，并在每一轮之间复用。
pub struct Pipeline<S, T, C = GzipCompressor> {
    simulator: S,
    transport: T,
    compressor: C,
    table: FieldValueTable,
    encoder: RowEncoder,
    accumulator: BatchAccumulator,
    cursor: InterleaveCursor,
    tag_error_policy: TagErrorPolicy,
    point: Point,
    summary: RunSummary,
}

impl<S, T, C> Pipeline<S, T, C>
where
    S: Simulator,
    T: Transport,
    C: Compressor,
{
    /// 校验配置并创建驱动
    pub fn new(config: &GeneratorConfig, table: FieldValueTable, simulator: S, transport: T, compressor: C) -> LoadResult<Self> {
        config.validate()?;

        Ok(Self {
            simulator,
            transport,
            compressor,
            table,
            encoder: RowEncoder::new(),
            accumulator: BatchAccumulator::new(config.batch_size),
            cursor: InterleaveCursor::new(config.interleaved_group_id, config.interleaved_num_groups)?,
            tag_error_policy: config.tag_error_policy,
            point: Point::new(),
            summary: RunSummary::default(),
        })
    }

    /// 运行到模拟器结束。出现致命错误时返回 [`LoadError::BatchFailed`]
    pub async fn run(mut self) -> LoadResult<RunSummary> {
        while !self.simulator.finished() {
            let write = self.simulator.next(&mut self.point);
            self.summary.points_generated += 1;

            if self.cursor.is_current() {
                self.summary.points_attributed += 1;

                if write {
                    self.write_point()?;
                }
            }

            self.point.reset();
            self.cursor.advance();

            if self.accumulator.should_flush() {
                self.flush().await?;
            }
        }

        if !self.accumulator.is_empty() {
            log::debug!("flush the last {} rows", self.accumulator.len());
        }

        self.flush().await?;

        Ok(self.summary)
    }

    fn write_point(&mut self) -> LoadResult<()> {
        match self.encoder.encode(&self.point, &self.table) {
            Ok(row) => {
                self.accumulator.append(row);
                self.summary.points_written += 1;
                Ok(())
            }

            Err(e) => match self.tag_error_policy {
                TagErrorPolicy::Skip => {
                    log::warn!("skip point {} at {}: {}", self.point.measurement_name(), iso8601(self.point.timestamp()), e);
                    self.summary.points_skipped += 1;
                    Ok(())
                }

                TagErrorPolicy::Abort => Err(LoadError::BatchFailed {
                    batch: self.accumulator.next_index(),
                    rows: self.accumulator.len(),
                    source: Box::new(e),
                }),
            },
        }
    }

    /// 压缩并发送当前批次。批次为空时什么都不做
    async fn flush(&mut self) -> LoadResult<()> {
        let Some(Batch { index, rows, data }) = self.accumulator.flush() else {
            return Ok(());
        };

        let lost = |source: LoadError| LoadError::BatchFailed {
            batch: index,
            rows,
            source: Box::new(source),
        };

        let body = self.compressor.compress(&data).map_err(lost)?;
        let compressed = body.len();

        log::debug!("push batch #{} with {} rows, {} bytes compressed into {} bytes", index, rows, data.len(), compressed);

        let request = WriteRequest::new(body, self.compressor.content_encoding());
        if let Err(e) = self.transport.push(request).await {
            log::error!("push batch #{} failed: {}", index, e);
            return Err(lost(e));
        }

        self.summary.batches_pushed += 1;
        self.summary.rows_pushed += rows as u64;
        self.summary.raw_bytes += data.len() as u64;
        self.summary.compressed_bytes += compressed as u64;

        Ok(())
    }
}

/// 按配置生成数据并写入目标库
pub async fn generate(config: GeneratorConfig) -> LoadResult<RunSummary> {
    config.validate()?;

    let table = FieldValueTable::for_use_case(config.use_case)?;
    let simulator = simulator::from_config(&config)?;
    let transport = WriteClient::from_config(&config.writer)?;

    log::info!(
        "generate {} data for scale {} from {} to {}, group {} of {}, write to {}",
        config.use_case,
        config.scale,
        iso8601(config.time_start),
        iso8601(config.time_end),
        config.interleaved_group_id,
        config.interleaved_num_groups,
        transport.write_url()
    );

    let summary = Pipeline::new(&config, table, simulator, transport, GzipCompressor::default())?.run().await?;

    log::info!("generate finished, {}", summary);

    Ok(summary)
}
