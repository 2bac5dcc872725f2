use std::collections::BTreeMap;

use crate::coords::{ColorRgba, Mat4};
use crate::resource::{Handle, HandleError, HandleKind, RawHandle, Resource, SlotMap};
use crate::script::Value;

use super::marshal::ScratchText;
use super::BridgeError;

fn as_int(value: &Value) -> Option<i64> {
    match *value {
        Value::Int(i) => Some(i),
        Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(f as i64),
        Value::Bool(b) => Some(i64::from(b)),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f32> {
    match *value {
        Value::Float(f) => Some(f as f32),
        Value::Int(i) => Some(i as f32),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match *value {
        Value::Bool(b) => Some(b),
        Value::Int(i) => Some(i != 0),
        Value::Nil => Some(false),
        _ => None,
    }
}

/// Positional arguments of one internal call.
#[derive(Debug, Copy, Clone)]
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&'a Value, BridgeError> {
        self.values.get(index).ok_or(BridgeError::Missing { index })
    }

    /// True when the argument was passed and is not nil.
    pub fn is_present(&self, index: usize) -> bool {
        self.values.get(index).is_some_and(|v| !v.is_nil())
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> BridgeError {
        BridgeError::Type {
            index,
            expected,
            found: self.values.get(index).map_or("nothing", Value::type_name),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64, BridgeError> {
        as_int(self.get(index)?).ok_or_else(|| self.mismatch(index, "int"))
    }

    pub fn uint(&self, index: usize) -> Result<u32, BridgeError> {
        let v = self.int(index)?;
        u32::try_from(v).map_err(|_| BridgeError::Range {
            index,
            reason: format!("{v} is not a valid unsigned 32-bit value"),
        })
    }

    pub fn float(&self, index: usize) -> Result<f32, BridgeError> {
        as_float(self.get(index)?).ok_or_else(|| self.mismatch(index, "float"))
    }

    pub fn bool(&self, index: usize) -> Result<bool, BridgeError> {
        as_bool(self.get(index)?).ok_or_else(|| self.mismatch(index, "bool"))
    }

    pub fn text(&self, index: usize) -> Result<ScratchText, BridgeError> {
        match self.get(index)? {
            Value::Text(bytes) => Ok(ScratchText::from_bytes(bytes)),
            _ => Err(self.mismatch(index, "text")),
        }
    }

    /// Exactly `len` floats.
    pub fn floats(&self, index: usize, len: usize) -> Result<&'a [f32], BridgeError> {
        match self.get(index)? {
            Value::Floats(v) if v.len() == len => Ok(v),
            Value::Floats(v) => Err(BridgeError::Range {
                index,
                reason: format!("expected {len} floats, got {}", v.len()),
            }),
            _ => Err(self.mismatch(index, "floats")),
        }
    }

    pub fn color(&self, index: usize) -> Result<ColorRgba, BridgeError> {
        let v = self.floats(index, 4)?;
        ColorRgba::from_slice(v).ok_or(BridgeError::Range {
            index,
            reason: "expected 4 floats".to_string(),
        })
    }

    pub fn opt_color(&self, index: usize) -> Result<Option<ColorRgba>, BridgeError> {
        if self.is_present(index) {
            self.color(index).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Row-major 4x4 matrix.
    pub fn mat4(&self, index: usize) -> Result<Mat4, BridgeError> {
        let v = self.floats(index, 16)?;
        Mat4::from_slice(v).ok_or(BridgeError::Range {
            index,
            reason: "expected 16 floats".to_string(),
        })
    }

    pub fn record(&self, index: usize) -> Result<Fields<'a>, BridgeError> {
        match self.get(index)? {
            Value::Record(map) => Ok(Fields { index, map }),
            _ => Err(self.mismatch(index, "record")),
        }
    }

    /// Raw handle bits. Scripts may pass handles back as plain integers.
    pub fn raw_handle(&self, index: usize) -> Result<u64, BridgeError> {
        match *self.get(index)? {
            Value::Handle(h) => Ok(h),
            Value::Int(i) if i >= 0 => Ok(i as u64),
            _ => Err(self.mismatch(index, "handle")),
        }
    }

    pub fn handle<T: Resource>(
        &self,
        index: usize,
        map: &SlotMap<T>,
    ) -> Result<Handle<T>, BridgeError> {
        Ok(map.resolve(self.raw_handle(index)?)?)
    }

    /// Missing, nil and zero all mean "no handle".
    pub fn opt_handle<T: Resource>(
        &self,
        index: usize,
        map: &SlotMap<T>,
    ) -> Result<Option<Handle<T>>, BridgeError> {
        if !self.is_present(index) || self.raw_handle(index)? == 0 {
            return Ok(None);
        }
        self.handle(index, map).map(Some)
    }

    /// Checks a window handle. There is exactly one window: slot 0, generation 0.
    pub fn window(&self, index: usize) -> Result<(), BridgeError> {
        let raw = RawHandle::from_bits(self.raw_handle(index)?).ok_or(HandleError::Null)?;
        if raw.kind() != Some(HandleKind::Window) {
            return Err(HandleError::WrongKind {
                expected: HandleKind::Window,
                found: raw.tag(),
            }
            .into());
        }
        if raw != window_handle() {
            return Err(HandleError::Stale {
                kind: HandleKind::Window,
                index: raw.index().unwrap_or(u32::MAX),
                generation: raw.generation(),
            }
            .into());
        }
        Ok(())
    }
}

/// The handle scripts get from `Engine_GetWindow`.
pub fn window_handle() -> RawHandle {
    RawHandle::new(HandleKind::Window, 0, 0)
}

/// Named fields of a record argument. Missing fields read as zero/false.
#[derive(Debug, Copy, Clone)]
pub struct Fields<'a> {
    index: usize,
    map: &'a BTreeMap<String, Value>,
}

impl Fields<'_> {
    fn field_error(&self, key: &str, expected: &'static str) -> BridgeError {
        BridgeError::Range {
            index: self.index,
            reason: format!("field '{key}' must be {expected}"),
        }
    }

    pub fn uint(&self, key: &str) -> Result<u32, BridgeError> {
        match self.map.get(key) {
            None | Some(Value::Nil) => Ok(0),
            Some(v) => as_int(v)
                .and_then(|i| u32::try_from(i).ok())
                .ok_or_else(|| self.field_error(key, "an unsigned integer")),
        }
    }

    pub fn bool(&self, key: &str) -> Result<bool, BridgeError> {
        match self.map.get(key) {
            None => Ok(false),
            Some(v) => as_bool(v).ok_or_else(|| self.field_error(key, "a bool")),
        }
    }
}
