//! 批次压缩

use std::io::Write;

use bytes::Bytes;
use flate2::{write::GzEncoder, Compression};

use crate::LoadResult;

pub trait Compressor {
    /// `Content-Encoding` 请求头的值
    fn content_encoding(&self) -> &'static str;

    /// 压缩一个完整的批次。返回错误时不会产生任何部分数据
    fn compress(&mut self, data: &[u8]) -> LoadResult<Bytes>;
}

/// gzip 压缩。输出缓冲区在每一轮开始前清空，跨批次复用
#[derive(Debug)]
pub struct GzipCompressor {
    level: Compression,
    scratch: Vec<u8>,
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new(Compression::default())
    }
}

impl GzipCompressor {
    pub fn new(level: Compression) -> Self {
        Self { level, scratch: vec![] }
    }
}

impl Compressor for GzipCompressor {
    fn content_encoding(&self) -> &'static str {
        "gzip"
    }

    fn compress(&mut self, data: &[u8]) -> LoadResult<Bytes> {
        self.scratch.clear();

        let mut encoder = GzEncoder::new(&mut self.scratch, self.level);
        encoder.write_all(data)?;
        encoder.finish()?;

        log::debug!("compressed {} bytes into {} bytes", data.len(), self.scratch.len());

        Ok(Bytes::copy_from_slice(&self.scratch))
    }
}

#[cfg(test)]
mod test_compress {
    use std::io::Read;

    use flate2::read::GzDecoder;

    use super::{Compressor, GzipCompressor};

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut out = vec![];
        GzDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_gzip_reuse() {
        let mut c = GzipCompressor::default();
        assert_eq!("gzip", c.content_encoding());

        let first = b"cpu,hostname=host_0 usage_user=1".repeat(20);
        let second = b"mem".to_vec();

        let a = c.compress(&first).unwrap();
        let b = c.compress(&second).unwrap();

        assert_eq!(first, gunzip(&a));
        assert_eq!(second, gunzip(&b));

        // 同样的输入产生同样的输出
        assert_eq!(a, c.compress(&first).unwrap());
    }
}
