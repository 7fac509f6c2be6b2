//! 批次累积

use bytes::{Bytes, BytesMut};

use crate::config::DEFAULT_BATCH_SIZE;

/// 一个已经封口、等待压缩发送的批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 批次序号，从 0 开始
    pub index: u64,

    /// 包含的行数
    pub rows: usize,

    /// 首尾相接的行数据，没有批次级别的头尾
    pub data: Bytes,
}

/// 累积编码后的行，行数超过阈值时通知调用方发送。
///
/// 缓冲区在每次 [`BatchAccumulator::flush`] 之后清空；
/// 当取走的 [`Bytes`] 被释放后，下一次追加会复用原来的内存。
#[derive(Debug)]
pub struct BatchAccumulator {
    buf: BytesMut,
    count: usize,
    threshold: usize,
    next_index: u64,
}

impl Default for BatchAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchAccumulator {
    pub fn new(threshold: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            count: 0,
            threshold,
            next_index: 0,
        }
    }

    /// 追加一行
    pub fn append(&mut self, row: &[u8]) {
        self.buf.extend_from_slice(row);
        self.count += 1;
    }

    /// 行数超过阈值时返回 `true`
    pub fn should_flush(&self) -> bool {
        self.count > self.threshold
    }

    /// 取走当前累积的数据并重置。没有数据时返回 `None`，批次序号也不增加
    pub fn flush(&mut self) -> Option<Batch> {
        if self.count == 0 {
            return None;
        }

        let batch = Batch {
            index: self.next_index,
            rows: self.count,
            data: self.buf.split().freeze(),
        };

        self.count = 0;
        self.next_index += 1;

        Some(batch)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// 当前累积的字节数
    pub fn bytes_len(&self) -> usize {
        self.buf.len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// 下一个批次的序号
    pub fn next_index(&self) -> u64 {
        self.next_index
    }
}

#[cfg(test)]
mod test_batch {
    use super::BatchAccumulator;

    #[test]
    fn test_flush_after_threshold_exceeded() {
        let mut acc = BatchAccumulator::new(3);

        for i in 0..3u8 {
            acc.append(&[i, i]);
            assert!(!acc.should_flush());
        }

        acc.append(&[9]);
        assert!(acc.should_flush());

        let batch = acc.flush().unwrap();
        assert_eq!(0, batch.index);
        assert_eq!(4, batch.rows);
        assert_eq!(&[0, 0, 1, 1, 2, 2, 9][..], &batch.data[..]);

        assert_eq!(0, acc.len());
        assert_eq!(0, acc.bytes_len());
        assert!(!acc.should_flush());
    }

    #[test]
    fn test_empty_flush() {
        let mut acc = BatchAccumulator::default();
        assert_eq!(100, acc.threshold());
        assert!(acc.is_empty());
        assert!(acc.flush().is_none());
        assert_eq!(0, acc.next_index());

        acc.append(b"row");
        assert!(!acc.is_empty());
        assert_eq!(0, acc.flush().unwrap().index);
        assert!(acc.flush().is_none());

        acc.append(b"row");
        assert_eq!(1, acc.flush().unwrap().index);
    }
}
