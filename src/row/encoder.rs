use flatbuffers::{FlatBufferBuilder, WIPOffset};

use crate::{
    error::LoadError,
    field_table::FieldValueTable,
    model::{Point, TagValue},
    protos::flat_metrics::{KeyValue, KeyValueBuilder, MetricBuilder, SimpleField, SimpleFieldBuilder, SimpleFieldType},
    util::debug_bytes,
    LoadResult,
};

/// 所有字段都以这个聚合类型写入
pub const FIELD_TYPE: SimpleFieldType = SimpleFieldType::Last;

/// 把一个数据点编码成一行带长度前缀的 flat metrics 数据。
///
/// 内部的 [`FlatBufferBuilder`] 以及偏移量缓冲在每次编码前重置并复用。
pub struct RowEncoder {
    fbb: FlatBufferBuilder<'static>,
    key_values: Vec<WIPOffset<KeyValue<'static>>>,
    simple_fields: Vec<WIPOffset<SimpleField<'static>>>,
}

impl Default for RowEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RowEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowEncoder").finish_non_exhaustive()
    }
}

impl RowEncoder {
    pub fn new() -> Self {
        Self {
            fbb: FlatBufferBuilder::with_capacity(1024),
            key_values: vec![],
            simple_fields: vec![],
        }
    }

    /// 编码一个数据点。
    ///
    /// - 值为 [`TagValue::Null`] 的标签被忽略
    /// - 其他非字符串的标签值返回 [`LoadError::UnsupportedTagValue`]，不会产生任何数据
    /// - 字段值从 `table` 中按字段名查找，数据点自带的值不使用
    ///
    /// 返回的切片在下一次调用 `encode` 之前有效
    pub fn encode(&mut self, point: &Point, table: &FieldValueTable) -> LoadResult<&[u8]> {
        for (key, value) in point.tags() {
            match value {
                TagValue::Null | TagValue::String(_) => {}
                other => {
                    return Err(LoadError::UnsupportedTagValue {
                        key: key.clone(),
                        kind: other.kind(),
                    });
                }
            }
        }

        self.fbb.reset();
        self.key_values.clear();
        self.simple_fields.clear();

        for (key, value) in point.tags() {
            if let TagValue::String(s) = value {
                let k = self.fbb.create_string(key);
                let v = self.fbb.create_string(s);

                let mut kv_builder = KeyValueBuilder::new(&mut self.fbb);
                kv_builder.add_key(k);
                kv_builder.add_value(v);
                self.key_values.push(kv_builder.finish());
            }
        }

        for (name, _) in point.fields() {
            let value = table.value_of(name);
            let n = self.fbb.create_string(name);

            let mut sf_builder = SimpleFieldBuilder::new(&mut self.fbb);
            sf_builder.add_name(n);
            sf_builder.add_type_(FIELD_TYPE);
            sf_builder.add_value(value);
            self.simple_fields.push(sf_builder.finish());
        }

        let key_values = self.fbb.create_vector(&self.key_values);
        let simple_fields = self.fbb.create_vector(&self.simple_fields);
        let name = self.fbb.create_string(point.measurement_name());

        let mut m_builder = MetricBuilder::new(&mut self.fbb);
        m_builder.add_name(name);
        m_builder.add_timestamp(point.timestamp().timestamp_millis());
        m_builder.add_key_values(key_values);
        m_builder.add_simple_fields(simple_fields);
        let metric = m_builder.finish();

        self.fbb.finish_size_prefixed(metric, None);

        let row = self.fbb.finished_data();
        debug_bytes(row);

        Ok(row)
    }
}
