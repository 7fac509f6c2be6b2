use byteorder::{ByteOrder, LittleEndian};

use crate::{
    error::LoadError,
    protos::flat_metrics::{size_prefixed_root_as_metric, Metric},
    LoadResult,
};

const SIZE_PREFIX_LEN: usize = 4;

/// 遍历一个写入负载中首尾相接的行。每一行都会经过 flatbuffer 校验
#[derive(Debug, Clone)]
pub struct RowIter<'a> {
    buf: &'a [u8],
}

impl<'a> Iterator for RowIter<'a> {
    type Item = LoadResult<Metric<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }

        if self.buf.len() < SIZE_PREFIX_LEN {
            let remaining = self.buf.len();
            self.buf = &[];
            return Some(Err(LoadError::RowDecode(format!("truncated size prefix, {} bytes remaining", remaining))));
        }

        let end = SIZE_PREFIX_LEN + LittleEndian::read_u32(&self.buf[..SIZE_PREFIX_LEN]) as usize;

        if self.buf.len() < end {
            let remaining = self.buf.len();
            self.buf = &[];
            return Some(Err(LoadError::RowDecode(format!("row needs {} bytes but only {} remaining", end, remaining))));
        }

        let (row, rest) = self.buf.split_at(end);
        self.buf = rest;

        Some(size_prefixed_root_as_metric(row).map_err(LoadError::from))
    }
}

/// 按写入接口的格式解码负载（未压缩）
pub fn decode_rows(buf: &[u8]) -> RowIter<'_> {
    RowIter { buf }
}
