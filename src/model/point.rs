use chrono::{DateTime, Utc};

/// 标签值。写入 LinDB 的时候只支持字符串，其他类型在编码时会报错
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TagValue {
    #[default]
    Null,
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
}

impl TagValue {
    /// 类型名称，用于错误信息
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::Boolean(_) => "boolean",
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<TagValue>> From<Option<T>> for TagValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(TagValue::Null)
    }
}

/// 模拟器产生的一个数据点。
///
/// 数据点由驱动循环持有并反复使用：每次编码之后都要调用 [`Point::reset`]，
/// 清空内容但保留已经分配的容量。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
    measurement_name: String,
    timestamp: DateTime<Utc>,
    tags: Vec<(String, TagValue)>,
    fields: Vec<(String, f64)>,
}

impl Point {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置度量名称
    pub fn set_measurement_name(&mut self, name: &str) {
        self.measurement_name.clear();
        self.measurement_name.push_str(name);
    }

    /// 设置时间戳
    pub fn set_timestamp(&mut self, ts: DateTime<Utc>) {
        self.timestamp = ts;
    }

    /// 追加一个标签，保持追加的顺序
    pub fn append_tag(&mut self, key: impl Into<String>, value: impl Into<TagValue>) {
        self.tags.push((key.into(), value.into()));
    }

    /// 追加一个字段。这里的值只是模拟器计算出来的，编码的时候会被字段值表替换
    pub fn append_field(&mut self, key: impl Into<String>, value: f64) {
        self.fields.push((key.into(), value));
    }

    pub fn measurement_name(&self) -> &str {
        &self.measurement_name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn tags(&self) -> &[(String, TagValue)] {
        &self.tags
    }

    pub fn fields(&self) -> &[(String, f64)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.measurement_name.is_empty() && self.tags.is_empty() && self.fields.is_empty()
    }

    /// 清空数据点，保留容量以便下一次使用
    pub fn reset(&mut self) {
        self.measurement_name.clear();
        self.timestamp = DateTime::<Utc>::default();
        self.tags.clear();
        self.fields.clear();
    }
}

#[cfg(test)]
mod test_point {
    use chrono::{DateTime, Utc};

    use super::{Point, TagValue};

    #[test]
    fn test_reset_keeps_capacity() {
        let mut p = Point::new();
        p.set_measurement_name("cpu");
        p.set_timestamp(DateTime::parse_from_rfc3339("2023-12-13T00:00:01Z").unwrap().with_timezone(&Utc));
        p.append_tag("hostname", "host_0");
        p.append_tag("rack", None::<String>);
        p.append_field("usage_user", 1.0);
        p.append_field("usage_system", 2.0);

        assert_eq!(2, p.tags().len());
        assert_eq!(&TagValue::Null, &p.tags()[1].1);

        let tag_cap = p.tags.capacity();
        let field_cap = p.fields.capacity();

        p.reset();

        assert!(p.is_empty());
        assert_eq!(DateTime::<Utc>::default(), p.timestamp());
        assert!(p.tags.capacity() >= tag_cap);
        assert!(p.fields.capacity() >= field_cap);
    }

    #[test]
    fn test_tag_value_kind() {
        assert_eq!("string", TagValue::from("a").kind());
        assert_eq!("double", TagValue::from(1.5).kind());
        assert_eq!("integer", TagValue::from(3i64).kind());
        assert_eq!("boolean", TagValue::from(true).kind());
        assert_eq!("null", TagValue::from(None::<&str>).kind());
    }
}
