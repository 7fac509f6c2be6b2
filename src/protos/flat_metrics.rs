// Bindings for `flat_metrics.fbs`, laid out the way `flatc --rust` emits them.
// Only the tables and accessors used by the write path are kept; `compound_field` is not bound.

#![allow(clippy::extra_unused_lifetimes)]

use flatbuffers::{FlatBufferBuilder, ForwardsUOffset, Follow, InvalidFlatbuffer, Table, TableUnfinishedWIPOffset, VOffsetT, Vector, Verifiable, Verifier, WIPOffset};

/// 字段的聚合类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i8)]
pub enum SimpleFieldType {
    #[default]
    Unspecified = 0,
    DeltaSum = 1,
    Gauge = 2,
    Max = 3,
    Min = 4,
    Last = 5,
    First = 6,
}

impl From<i8> for SimpleFieldType {
    fn from(value: i8) -> Self {
        match value {
            1 => Self::DeltaSum,
            2 => Self::Gauge,
            3 => Self::Max,
            4 => Self::Min,
            5 => Self::Last,
            6 => Self::First,
            _ => Self::Unspecified,
        }
    }
}

// KeyValue

#[derive(Copy, Clone, PartialEq)]
pub struct KeyValue<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for KeyValue<'a> {
    type Inner = KeyValue<'a>;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self { _tab: Table::new(buf, loc) }
    }
}

impl<'a> KeyValue<'a> {
    pub const VT_KEY: VOffsetT = 4;
    pub const VT_VALUE: VOffsetT = 6;

    #[inline]
    pub fn key(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(KeyValue::VT_KEY, None) }
    }

    #[inline]
    pub fn value(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(KeyValue::VT_VALUE, None) }
    }
}

impl Verifiable for KeyValue<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<&str>>("key", Self::VT_KEY, false)?
            .visit_field::<ForwardsUOffset<&str>>("value", Self::VT_VALUE, false)?
            .finish();
        Ok(())
    }
}

pub struct KeyValueBuilder<'a: 'b, 'b> {
    fbb_: &'b mut FlatBufferBuilder<'a>,
    start_: WIPOffset<TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> KeyValueBuilder<'a, 'b> {
    #[inline]
    pub fn new(fbb: &'b mut FlatBufferBuilder<'a>) -> KeyValueBuilder<'a, 'b> {
        let start = fbb.start_table();
        KeyValueBuilder { fbb_: fbb, start_: start }
    }

    #[inline]
    pub fn add_key(&mut self, key: WIPOffset<&'a str>) {
        self.fbb_.push_slot_always::<WIPOffset<_>>(KeyValue::VT_KEY, key);
    }

    #[inline]
    pub fn add_value(&mut self, value: WIPOffset<&'a str>) {
        self.fbb_.push_slot_always::<WIPOffset<_>>(KeyValue::VT_VALUE, value);
    }

    #[inline]
    pub fn finish(self) -> WIPOffset<KeyValue<'a>> {
        let o = self.fbb_.end_table(self.start_);
        WIPOffset::new(o.value())
    }
}

// SimpleField

#[derive(Copy, Clone, PartialEq)]
pub struct SimpleField<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for SimpleField<'a> {
    type Inner = SimpleField<'a>;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self { _tab: Table::new(buf, loc) }
    }
}

impl<'a> SimpleField<'a> {
    pub const VT_NAME: VOffsetT = 4;
    pub const VT_TYPE_: VOffsetT = 6;
    pub const VT_VALUE: VOffsetT = 8;

    #[inline]
    pub fn name(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(SimpleField::VT_NAME, None) }
    }

    #[inline]
    pub fn type_(&self) -> SimpleFieldType {
        let raw = unsafe { self._tab.get::<i8>(SimpleField::VT_TYPE_, Some(0)) };
        SimpleFieldType::from(raw.unwrap_or_default())
    }

    #[inline]
    pub fn value(&self) -> f64 {
        unsafe { self._tab.get::<f64>(SimpleField::VT_VALUE, Some(0.0)) }.unwrap_or_default()
    }
}

impl Verifiable for SimpleField<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<&str>>("name", Self::VT_NAME, false)?
            .visit_field::<i8>("type_", Self::VT_TYPE_, false)?
            .visit_field::<f64>("value", Self::VT_VALUE, false)?
            .finish();
        Ok(())
    }
}

pub struct SimpleFieldBuilder<'a: 'b, 'b> {
    fbb_: &'b mut FlatBufferBuilder<'a>,
    start_: WIPOffset<TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> SimpleFieldBuilder<'a, 'b> {
    #[inline]
    pub fn new(fbb: &'b mut FlatBufferBuilder<'a>) -> SimpleFieldBuilder<'a, 'b> {
        let start = fbb.start_table();
        SimpleFieldBuilder { fbb_: fbb, start_: start }
    }

    #[inline]
    pub fn add_name(&mut self, name: WIPOffset<&'a str>) {
        self.fbb_.push_slot_always::<WIPOffset<_>>(SimpleField::VT_NAME, name);
    }

    #[inline]
    pub fn add_type_(&mut self, type_: SimpleFieldType) {
        self.fbb_.push_slot::<i8>(SimpleField::VT_TYPE_, type_ as i8, 0);
    }

    #[inline]
    pub fn add_value(&mut self, value: f64) {
        self.fbb_.push_slot::<f64>(SimpleField::VT_VALUE, value, 0.0);
    }

    #[inline]
    pub fn finish(self) -> WIPOffset<SimpleField<'a>> {
        let o = self.fbb_.end_table(self.start_);
        WIPOffset::new(o.value())
    }
}

// Metric

#[derive(Copy, Clone, PartialEq)]
pub struct Metric<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for Metric<'a> {
    type Inner = Metric<'a>;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self { _tab: Table::new(buf, loc) }
    }
}

impl<'a> Metric<'a> {
    pub const VT_NAMESPACE: VOffsetT = 4;
    pub const VT_NAME: VOffsetT = 6;
    pub const VT_TIMESTAMP: VOffsetT = 8;
    pub const VT_KEY_VALUES: VOffsetT = 10;
    pub const VT_HASH: VOffsetT = 12;
    pub const VT_SIMPLE_FIELDS: VOffsetT = 14;

    #[inline]
    pub fn name(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Metric::VT_NAME, None) }
    }

    #[inline]
    pub fn timestamp(&self) -> i64 {
        unsafe { self._tab.get::<i64>(Metric::VT_TIMESTAMP, Some(0)) }.unwrap_or_default()
    }

    #[inline]
    pub fn key_values(&self) -> Option<Vector<'a, ForwardsUOffset<KeyValue<'a>>>> {
        unsafe { self._tab.get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<KeyValue>>>>(Metric::VT_KEY_VALUES, None) }
    }

    #[inline]
    pub fn simple_fields(&self) -> Option<Vector<'a, ForwardsUOffset<SimpleField<'a>>>> {
        unsafe { self._tab.get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<SimpleField>>>>(Metric::VT_SIMPLE_FIELDS, None) }
    }
}

impl Verifiable for Metric<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<&str>>("namespace", Self::VT_NAMESPACE, false)?
            .visit_field::<ForwardsUOffset<&str>>("name", Self::VT_NAME, false)?
            .visit_field::<i64>("timestamp", Self::VT_TIMESTAMP, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<KeyValue>>>>("key_values", Self::VT_KEY_VALUES, false)?
            .visit_field::<u64>("hash", Self::VT_HASH, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<SimpleField>>>>("simple_fields", Self::VT_SIMPLE_FIELDS, false)?
            .finish();
        Ok(())
    }
}

pub struct MetricBuilder<'a: 'b, 'b> {
    fbb_: &'b mut FlatBufferBuilder<'a>,
    start_: WIPOffset<TableUnfinishedWIPOffset>,
}

impl<'a: 'b, 'b> MetricBuilder<'a, 'b> {
    #[inline]
    pub fn new(fbb: &'b mut FlatBufferBuilder<'a>) -> MetricBuilder<'a, 'b> {
        let start = fbb.start_table();
        MetricBuilder { fbb_: fbb, start_: start }
    }

    #[inline]
    pub fn add_name(&mut self, name: WIPOffset<&'a str>) {
        self.fbb_.push_slot_always::<WIPOffset<_>>(Metric::VT_NAME, name);
    }

    #[inline]
    pub fn add_timestamp(&mut self, timestamp: i64) {
        self.fbb_.push_slot::<i64>(Metric::VT_TIMESTAMP, timestamp, 0);
    }

    #[inline]
    pub fn add_key_values(&mut self, key_values: WIPOffset<Vector<'a, ForwardsUOffset<KeyValue<'a>>>>) {
        self.fbb_.push_slot_always::<WIPOffset<_>>(Metric::VT_KEY_VALUES, key_values);
    }

    #[inline]
    pub fn add_simple_fields(&mut self, simple_fields: WIPOffset<Vector<'a, ForwardsUOffset<SimpleField<'a>>>>) {
        self.fbb_.push_slot_always::<WIPOffset<_>>(Metric::VT_SIMPLE_FIELDS, simple_fields);
    }

    #[inline]
    pub fn finish(self) -> WIPOffset<Metric<'a>> {
        let o = self.fbb_.end_table(self.start_);
        WIPOffset::new(o.value())
    }
}

/// 校验并读取一个带长度前缀的 `Metric`
#[inline]
pub fn size_prefixed_root_as_metric(buf: &[u8]) -> Result<Metric<'_>, InvalidFlatbuffer> {
    flatbuffers::size_prefixed_root::<Metric>(buf)
}
