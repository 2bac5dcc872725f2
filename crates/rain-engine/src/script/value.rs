use std::collections::BTreeMap;

/// Value crossing the scripting boundary.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Opaque resource handle (see `resource::RawHandle`).
    Handle(u64),
    /// Text as raw bytes; native code treats it as UTF-8.
    Text(Vec<u8>),
    /// Small fixed-size vectors: sizes, colors, matrices.
    Floats(Vec<f32>),
    /// Named fields, e.g. a texture descriptor.
    Record(BTreeMap<String, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Handle(_) => "handle",
            Value::Text(_) => "text",
            Value::Floats(_) => "floats",
            Value::Record(_) => "record",
        }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.as_bytes().to_vec())
    }
}
