//! Typed parameter slots
//!
//! A [`Parameter`] is the 48-byte plain-old-data cell stored in every batch
//! record: a "has been written" flag, a 16-byte name, the kind tag and a
//! 24-byte value union. The union is never read through a mismatched kind;
//! every accessor checks the tag first and reports [`LinkError::TypeMismatch`].
//!
//! | Offset | Size | Field   |
//! |--------|------|---------|
//! | 0      | 1    | is_set  |
//! | 1      | 16   | name    |
//! | 18     | 2    | kind    |
//! | 24     | 24   | value   |

use crate::error::{LinkError, LinkResult};
use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::fmt;
use wavelink::consts::{PARAM_NAME_CAPACITY, PARAM_VALUE_SIZE, PARAMETER_SIZE};
use wavelink::kind::ParameterKind;

/// Decoded parameter value, one variant per kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// 64-bit signed integer
    S64(i64),
    /// Three 32-bit floats
    Vec3Float([f32; 3]),
    /// Three 64-bit floats
    Vec3Double([f64; 3]),
}

impl ParameterValue {
    /// Kind tag matching this variant.
    pub const fn kind(&self) -> ParameterKind {
        match self {
            Self::Float(_) => ParameterKind::Float,
            Self::Double(_) => ParameterKind::Double,
            Self::S64(_) => ParameterKind::S64,
            Self::Vec3Float(_) => ParameterKind::Vec3Float,
            Self::Vec3Double(_) => ParameterKind::Vec3Double,
        }
    }

    /// Zero value of `kind`.
    pub const fn zero(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Float => Self::Float(0.0),
            ParameterKind::Double => Self::Double(0.0),
            ParameterKind::S64 => Self::S64(0),
            ParameterKind::Vec3Float => Self::Vec3Float([0.0; 3]),
            ParameterKind::Vec3Double => Self::Vec3Double([0.0; 3]),
        }
    }

    fn encode(&self) -> [u8; PARAM_VALUE_SIZE] {
        let mut raw = [0u8; PARAM_VALUE_SIZE];
        match *self {
            Self::Float(v) => raw[..4].copy_from_slice(&v.to_ne_bytes()),
            Self::Double(v) => raw[..8].copy_from_slice(&v.to_ne_bytes()),
            Self::S64(v) => raw[..8].copy_from_slice(&v.to_ne_bytes()),
            Self::Vec3Float(v) => {
                for (chunk, c) in raw.chunks_exact_mut(4).zip(v) {
                    chunk.copy_from_slice(&c.to_ne_bytes());
                }
            }
            Self::Vec3Double(v) => {
                for (chunk, c) in raw.chunks_exact_mut(8).zip(v) {
                    chunk.copy_from_slice(&c.to_ne_bytes());
                }
            }
        }
        raw
    }

    fn decode(kind: ParameterKind, raw: &[u8; PARAM_VALUE_SIZE]) -> Self {
        let f32_at = |i: usize| f32::from_ne_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
        let word_at = |i: usize| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&raw[i..i + 8]);
            bytes
        };
        match kind {
            ParameterKind::Float => Self::Float(f32_at(0)),
            ParameterKind::Double => Self::Double(f64::from_ne_bytes(word_at(0))),
            ParameterKind::S64 => Self::S64(i64::from_ne_bytes(word_at(0))),
            ParameterKind::Vec3Float => Self::Vec3Float([f32_at(0), f32_at(4), f32_at(8)]),
            ParameterKind::Vec3Double => Self::Vec3Double([
                f64::from_ne_bytes(word_at(0)),
                f64::from_ne_bytes(word_at(8)),
                f64::from_ne_bytes(word_at(16)),
            ]),
        }
    }
}

impl From<f32> for ParameterValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<i64> for ParameterValue {
    fn from(v: i64) -> Self {
        Self::S64(v)
    }
}

impl From<[f32; 3]> for ParameterValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3Float(v)
    }
}

impl From<[f64; 3]> for ParameterValue {
    fn from(v: [f64; 3]) -> Self {
        Self::Vec3Double(v)
    }
}

/// One named, typed parameter cell as laid out in record memory
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Parameter {
    is_set: u8,
    name: [u8; PARAM_NAME_CAPACITY],
    _pad0: u8,
    kind: u16,
    _pad1: [u8; 4],
    value: [u64; 3],
}

const_assert_eq!(std::mem::size_of::<Parameter>(), PARAMETER_SIZE);
const_assert_eq!(std::mem::align_of::<Parameter>(), 8);
const_assert_eq!(std::mem::size_of::<[u64; 3]>(), PARAM_VALUE_SIZE);

impl Default for Parameter {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl Parameter {
    /// Named parameter holding `value`, marked as set.
    ///
    /// An invalid name leaves the parameter unnamed.
    pub fn new(name: &str, value: impl Into<ParameterValue>) -> Self {
        let mut param = Self::zeroed();
        param.set_name(name);
        param.set_value(value);
        param
    }

    /// Named parameter of `kind` with a zero value, not yet set.
    pub fn declare(name: &str, kind: ParameterKind) -> Self {
        let mut param = Self::zeroed();
        param.set_name(name);
        param.store(ParameterValue::zero(kind));
        param
    }

    /// Name as text, empty when unnamed.
    pub fn name(&self) -> &str {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(PARAM_NAME_CAPACITY);
        std::str::from_utf8(&self.name[..len]).unwrap_or("")
    }

    /// Whether the parameter carries a usable name.
    pub fn has_name(&self) -> bool {
        !self.name().is_empty()
    }

    /// Rename the parameter.
    ///
    /// Returns `false` and keeps the old name when `name` is empty or
    /// longer than 16 bytes.
    pub fn set_name(&mut self, name: &str) -> bool {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > PARAM_NAME_CAPACITY {
            tracing::warn!(
                "rejected parameter name {:?}: must be 1..={} bytes",
                name,
                PARAM_NAME_CAPACITY
            );
            return false;
        }
        self.name = [0; PARAM_NAME_CAPACITY];
        self.name[..bytes.len()].copy_from_slice(bytes);
        true
    }

    /// Raw kind tag as stored in memory.
    #[inline]
    pub fn raw_kind(&self) -> u16 {
        self.kind
    }

    /// Stored kind.
    ///
    /// Fails with `CorruptKind` if record memory holds an unknown tag.
    pub fn kind(&self) -> LinkResult<ParameterKind> {
        ParameterKind::from_raw(self.kind).ok_or(LinkError::CorruptKind { raw: self.kind })
    }

    /// Whether a value has been written since the flag was last cleared.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.is_set != 0
    }

    /// Set or clear the "has been written" flag.
    #[inline]
    pub fn set_is_set(&mut self, set: bool) {
        self.is_set = u8::from(set);
    }

    /// Overwrite kind and value together and mark the parameter set.
    pub fn set_value(&mut self, value: impl Into<ParameterValue>) {
        self.store(value.into());
        self.is_set = 1;
    }

    /// Refresh the value without re-typing the parameter.
    ///
    /// Fails with `TypeMismatch` if `value` is of a different kind than the
    /// one stored.
    pub fn refresh_value(&mut self, value: ParameterValue) -> LinkResult<()> {
        let stored = self.kind()?;
        if stored != value.kind() {
            return Err(LinkError::TypeMismatch {
                expected: value.kind(),
                actual: stored,
            });
        }
        self.set_value(value);
        Ok(())
    }

    /// Decoded value of the stored kind.
    pub fn value(&self) -> LinkResult<ParameterValue> {
        Ok(ParameterValue::decode(self.kind()?, self.raw_value()))
    }

    /// Decoded value, checked against `kind`.
    pub fn get_value(&self, kind: ParameterKind) -> LinkResult<ParameterValue> {
        self.expect_kind(kind)?;
        self.value()
    }

    /// Value of a `FLOAT` parameter.
    pub fn float(&self) -> LinkResult<f32> {
        match self.get_value(ParameterKind::Float)? {
            ParameterValue::Float(v) => Ok(v),
            other => Err(self.mismatch(ParameterKind::Float, other)),
        }
    }

    /// Value of a `DOUBLE` parameter.
    pub fn double(&self) -> LinkResult<f64> {
        match self.get_value(ParameterKind::Double)? {
            ParameterValue::Double(v) => Ok(v),
            other => Err(self.mismatch(ParameterKind::Double, other)),
        }
    }

    /// Value of an `S64` parameter.
    pub fn s64(&self) -> LinkResult<i64> {
        match self.get_value(ParameterKind::S64)? {
            ParameterValue::S64(v) => Ok(v),
            other => Err(self.mismatch(ParameterKind::S64, other)),
        }
    }

    /// Value of a `VEC3_FLOAT` parameter.
    pub fn vec3f(&self) -> LinkResult<[f32; 3]> {
        match self.get_value(ParameterKind::Vec3Float)? {
            ParameterValue::Vec3Float(v) => Ok(v),
            other => Err(self.mismatch(ParameterKind::Vec3Float, other)),
        }
    }

    /// Value of a `VEC3_DOUBLE` parameter.
    pub fn vec3d(&self) -> LinkResult<[f64; 3]> {
        match self.get_value(ParameterKind::Vec3Double)? {
            ParameterValue::Vec3Double(v) => Ok(v),
            other => Err(self.mismatch(ParameterKind::Vec3Double, other)),
        }
    }

    /// Component `index` (0, 1 or 2) of a `VEC3_FLOAT` parameter.
    pub fn vec3f_component(&self, index: usize) -> LinkResult<f32> {
        let v = self.vec3f()?;
        v.get(index)
            .copied()
            .ok_or(LinkError::IndexOutOfRange { index, len: 3 })
    }

    /// Component `index` (0, 1 or 2) of a `VEC3_DOUBLE` parameter.
    pub fn vec3d_component(&self, index: usize) -> LinkResult<f64> {
        let v = self.vec3d()?;
        v.get(index)
            .copied()
            .ok_or(LinkError::IndexOutOfRange { index, len: 3 })
    }

    fn expect_kind(&self, expected: ParameterKind) -> LinkResult<()> {
        let actual = self.kind()?;
        if actual != expected {
            return Err(LinkError::TypeMismatch { expected, actual });
        }
        Ok(())
    }

    fn mismatch(&self, expected: ParameterKind, found: ParameterValue) -> LinkError {
        LinkError::TypeMismatch {
            expected,
            actual: found.kind(),
        }
    }

    fn raw_value(&self) -> &[u8; PARAM_VALUE_SIZE] {
        bytemuck::cast_ref(&self.value)
    }

    fn store(&mut self, value: ParameterValue) {
        let raw = value.encode();
        let dst: &mut [u8; PARAM_VALUE_SIZE] = bytemuck::cast_mut(&mut self.value);
        dst.copy_from_slice(&raw);
        self.kind = value.kind().as_raw();
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Parameter");
        s.field("name", &self.name()).field("is_set", &self.is_set());
        match self.value() {
            Ok(value) => s.field("value", &value),
            Err(_) => s.field("raw_kind", &self.kind),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wavelink::kind::PARAMETER_KINDS;

    fn sample(kind: ParameterKind) -> ParameterValue {
        match kind {
            ParameterKind::Float => ParameterValue::Float(1.456),
            ParameterKind::Double => ParameterValue::Double(3.1516926),
            ParameterKind::S64 => ParameterValue::S64(-12),
            ParameterKind::Vec3Float => ParameterValue::Vec3Float([1.0, 2.0, 3.0]),
            ParameterKind::Vec3Double => ParameterValue::Vec3Double([3.0, 2.0, 1.0]),
        }
    }

    fn typed_get(param: &Parameter, kind: ParameterKind) -> LinkResult<ParameterValue> {
        match kind {
            ParameterKind::Float => param.float().map(ParameterValue::Float),
            ParameterKind::Double => param.double().map(ParameterValue::Double),
            ParameterKind::S64 => param.s64().map(ParameterValue::S64),
            ParameterKind::Vec3Float => param.vec3f().map(ParameterValue::Vec3Float),
            ParameterKind::Vec3Double => param.vec3d().map(ParameterValue::Vec3Double),
        }
    }

    #[test]
    fn test_layout_offsets() {
        let mut param = Parameter::zeroed();
        param.set_name("abc");
        param.set_value(7i64);
        let bytes = bytemuck::bytes_of(&param);
        assert_eq!(bytes.len(), 48);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..4], b"abc");
        assert_eq!(u16::from_ne_bytes([bytes[18], bytes[19]]), 2);
        assert_eq!(i64::from_ne_bytes(bytes[24..32].try_into().unwrap()), 7);
    }

    #[test]
    fn test_zeroed_is_unnamed_unset_float() {
        let param = Parameter::default();
        assert_eq!(param.name(), "");
        assert!(!param.has_name());
        assert!(!param.is_set());
        assert_eq!(param.kind().unwrap(), ParameterKind::Float);
    }

    #[test]
    fn test_typed_roundtrip_and_mismatch() {
        for kind in PARAMETER_KINDS {
            let mut param = Parameter::zeroed();
            param.set_value(sample(kind));
            assert!(param.is_set());
            assert_eq!(param.kind().unwrap(), kind);
            assert_eq!(typed_get(&param, kind).unwrap(), sample(kind));
            assert_eq!(param.get_value(kind).unwrap(), sample(kind));

            for other in PARAMETER_KINDS.into_iter().filter(|k| *k != kind) {
                assert!(matches!(
                    typed_get(&param, other),
                    Err(LinkError::TypeMismatch { expected, actual })
                        if expected == other && actual == kind
                ));
                assert!(matches!(
                    param.get_value(other),
                    Err(LinkError::TypeMismatch { .. })
                ));
            }
        }
    }

    #[test]
    fn test_set_value_retypes() {
        let mut param = Parameter::new("p", 1.5f32);
        param.set_value([1.0f64, 2.0, 3.0]);
        assert_eq!(param.kind().unwrap(), ParameterKind::Vec3Double);
        assert!(param.float().is_err());
        assert_eq!(param.vec3d().unwrap(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_vector_components() {
        let f = Parameter::new("vf", [1.0f32, 2.0, 3.0]);
        let d = Parameter::new("vd", [4.0f64, 5.0, 6.0]);
        for i in 0..3 {
            assert_eq!(f.vec3f_component(i).unwrap(), (i + 1) as f32);
            assert_eq!(d.vec3d_component(i).unwrap(), (i + 4) as f64);
        }
        assert!(matches!(
            f.vec3f_component(3),
            Err(LinkError::IndexOutOfRange { index: 3, .. })
        ));
        assert!(matches!(
            d.vec3d_component(usize::MAX),
            Err(LinkError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            f.vec3d_component(0),
            Err(LinkError::TypeMismatch { .. })
        ));
        assert!(matches!(
            Parameter::new("s", 1.0f64).vec3f_component(0),
            Err(LinkError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_set_name_bounds() {
        let mut param = Parameter::declare("keep", ParameterKind::Double);
        assert!(!param.set_name("seventeen_bytes_x"));
        assert_eq!(param.name(), "keep");
        assert!(!param.set_name(""));
        assert_eq!(param.name(), "keep");
        assert!(param.set_name("sixteen_bytes_ok"));
        assert_eq!(param.name(), "sixteen_bytes_ok");
        assert!(param.set_name("x"));
        assert_eq!(param.name(), "x");
    }

    #[test]
    fn test_declare_is_unset() {
        let param = Parameter::declare("gain", ParameterKind::S64);
        assert!(!param.is_set());
        assert_eq!(param.s64().unwrap(), 0);
    }

    #[test]
    fn test_refresh_value_same_kind_only() {
        let mut param = Parameter::declare("kp", ParameterKind::Double);
        param
            .refresh_value(ParameterValue::Double(2.5))
            .unwrap();
        assert!(param.is_set());
        assert_eq!(param.double().unwrap(), 2.5);

        param.set_is_set(false);
        let err = param.refresh_value(ParameterValue::Float(1.0)).unwrap_err();
        assert!(matches!(
            err,
            LinkError::TypeMismatch {
                expected: ParameterKind::Float,
                actual: ParameterKind::Double
            }
        ));
        assert!(!param.is_set());
        assert_eq!(param.double().unwrap(), 2.5);
    }

    #[test]
    fn test_corrupt_kind_is_reported() {
        let mut param = Parameter::new("x", 1.0f32);
        bytemuck::bytes_of_mut(&mut param)[18] = 9;
        assert!(matches!(
            param.kind(),
            Err(LinkError::CorruptKind { raw: 9 })
        ));
        assert!(param.float().is_err());
        assert!(format!("{:?}", param).contains("raw_kind"));
    }

    #[test]
    fn test_copy_is_bitwise() {
        let a = Parameter::new("copy", [7.0f64, 8.0, 9.0]);
        let b = a;
        assert_eq!(bytemuck::bytes_of(&a), bytemuck::bytes_of(&b));
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_name_accepts_1_to_16_bytes(name in "[a-zA-Z0-9_]{0,24}") {
            let mut param = Parameter::declare("orig", ParameterKind::Float);
            let ok = param.set_name(&name);
            prop_assert_eq!(ok, !name.is_empty() && name.len() <= 16);
            if ok {
                prop_assert_eq!(param.name(), name.as_str());
            } else {
                prop_assert_eq!(param.name(), "orig");
            }
        }

        #[test]
        fn prop_double_roundtrip(v in proptest::num::f64::NORMAL) {
            let param = Parameter::new("d", v);
            prop_assert_eq!(param.double().unwrap(), v);
        }

        #[test]
        fn prop_s64_roundtrip(v in any::<i64>()) {
            let param = Parameter::new("i", v);
            prop_assert_eq!(param.s64().unwrap(), v);
        }

        #[test]
        fn prop_vec3f_roundtrip(a in -1e6f32..1e6, b in -1e6f32..1e6, c in -1e6f32..1e6) {
            let param = Parameter::new("v", [a, b, c]);
            prop_assert_eq!(param.vec3f().unwrap(), [a, b, c]);
            prop_assert_eq!(param.vec3f_component(2).unwrap(), c);
        }
    }
}
