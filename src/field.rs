use serde_json::Value;

/// A key/value pair attached to a record, either at the call site or as a
/// standing field on a derived logger.
///
/// Values are plain JSON values. The remote envelope only ever inspects
/// `Value::String`, so `Field::new("trace_id", 7)` does not populate
/// `TraceId`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Field {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns the value when it is string-typed.
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

impl<K, V> From<(K, V)> for Field
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from((key, value): (K, V)) -> Self {
        Field::new(key, value)
    }
}

/// Build a `Vec<Field>` from `key => value` pairs.
///
/// ```
/// use tee_log_sink::fields;
///
/// let f = fields!["trace_id" => "abc123", "attempt" => 3];
/// assert_eq!(f.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => { ::std::vec::Vec::<$crate::field::Field>::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$($crate::field::Field::new($key, $value)),+]
    };
}

/// Order-preserving `standing ++ call_site`; duplicates are kept.
pub(crate) fn merge(standing: &[Field], call_site: &[Field]) -> Vec<Field> {
    let mut all = Vec::with_capacity(standing.len() + call_site.len());
    all.extend_from_slice(standing);
    all.extend_from_slice(call_site);
    all
}
