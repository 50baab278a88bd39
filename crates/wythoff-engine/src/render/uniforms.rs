//! Uniform block shared by every fragment program.
//!
//! The GLSL side is declared by the preamble in `glsl.rs`; field order and
//! padding here must match its std140 layout.

use std::fmt;

use bytemuck::{Pod, Zeroable};

/// CPU mirror of the `WythoffGlobals` uniform block (std140, 48 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Globals {
    pub resolution: [f32; 3],
    pub time: f32,
    pub mouse: [f32; 4],
    pub frame: i32,
    pub aa: i32,
    pub flip_y: i32,
    pub _pad: i32,
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            resolution: [0.0; 3],
            time: 0.0,
            mouse: [0.0; 4],
            frame: 0,
            aa: 1,
            flip_y: 0,
            _pad: 0,
        }
    }
}

/// A value assignable to a named uniform slot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
}

impl UniformValue {
    fn type_name(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Int(_) => "int",
        }
    }
}

/// Error returned when a named uniform write cannot be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformError {
    UnknownName(String),
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for UniformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformError::UnknownName(name) => write!(f, "no uniform named `{name}`"),
            UniformError::TypeMismatch {
                name,
                expected,
                found,
            } => write!(f, "uniform `{name}` is a {expected}, got a {found}"),
        }
    }
}

impl std::error::Error for UniformError {}

/// Uniform slot names accepted by [`UniformBlock::set`].
pub const UNIFORM_NAMES: [&str; 6] = ["iResolution", "iTime", "iMouse", "iFrame", "AA", "iFlipY"];

/// Named, dirty-tracked view over a [`Globals`] value.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    values: Globals,
    dirty: bool,
}

impl Default for UniformBlock {
    fn default() -> Self {
        Self {
            values: Globals::default(),
            // Never uploaded yet.
            dirty: true,
        }
    }
}

impl UniformBlock {
    pub fn values(&self) -> &Globals {
        &self.values
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes `value` into the slot called `name`.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let mismatch = |expected: &'static str| UniformError::TypeMismatch {
            name: name.to_string(),
            expected,
            found: value.type_name(),
        };

        let v = &mut self.values;
        match (name, value) {
            ("iResolution", UniformValue::Vec3(r)) => assign(&mut v.resolution, r, &mut self.dirty),
            ("iResolution", _) => return Err(mismatch("vec3")),
            ("iTime", UniformValue::Float(t)) => assign(&mut v.time, t, &mut self.dirty),
            ("iTime", _) => return Err(mismatch("float")),
            ("iMouse", UniformValue::Vec4(m)) => assign(&mut v.mouse, m, &mut self.dirty),
            ("iMouse", _) => return Err(mismatch("vec4")),
            ("iFrame", UniformValue::Int(i)) => assign(&mut v.frame, i, &mut self.dirty),
            ("iFrame", _) => return Err(mismatch("int")),
            ("AA", UniformValue::Int(i)) => assign(&mut v.aa, i, &mut self.dirty),
            ("AA", _) => return Err(mismatch("int")),
            ("iFlipY", UniformValue::Int(i)) => assign(&mut v.flip_y, i, &mut self.dirty),
            ("iFlipY", _) => return Err(mismatch("int")),
            _ => return Err(UniformError::UnknownName(name.to_string())),
        }
        Ok(())
    }

    pub fn set_resolution(&mut self, width: f32, height: f32) {
        assign(&mut self.values.resolution, [width, height, 0.0], &mut self.dirty);
    }

    pub fn set_time(&mut self, time: f32) {
        assign(&mut self.values.time, time, &mut self.dirty);
    }

    pub fn set_mouse(&mut self, mouse: [f32; 4]) {
        assign(&mut self.values.mouse, mouse, &mut self.dirty);
    }

    pub fn set_frame(&mut self, frame: i32) {
        assign(&mut self.values.frame, frame, &mut self.dirty);
    }

    pub fn set_aa(&mut self, aa: i32) {
        assign(&mut self.values.aa, aa, &mut self.dirty);
    }

    pub fn set_flip_y(&mut self, flip: bool) {
        assign(&mut self.values.flip_y, flip as i32, &mut self.dirty);
    }

    /// Returns the block if it changed since the last call.
    pub fn take_dirty(&mut self) -> Option<&Globals> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(&self.values)
    }
}

fn assign<T: PartialEq>(slot: &mut T, value: T, dirty: &mut bool) {
    if *slot != value {
        *slot = value;
        *dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn globals_follow_std140_layout() {
        assert_eq!(size_of::<Globals>(), 48);
        assert_eq!(offset_of!(Globals, resolution), 0);
        assert_eq!(offset_of!(Globals, time), 12);
        assert_eq!(offset_of!(Globals, mouse), 16);
        assert_eq!(offset_of!(Globals, frame), 32);
        assert_eq!(offset_of!(Globals, aa), 36);
        assert_eq!(offset_of!(Globals, flip_y), 40);
    }

    #[test]
    fn named_writes_land_in_their_slots() {
        let mut block = UniformBlock::default();
        block.set("iResolution", UniformValue::Vec3([800.0, 480.0, 0.0])).unwrap();
        block.set("iTime", UniformValue::Float(2.5)).unwrap();
        block.set("iMouse", UniformValue::Vec4([1.0, 2.0, 3.0, 4.0])).unwrap();
        block.set("iFrame", UniformValue::Int(7)).unwrap();
        block.set("AA", UniformValue::Int(2)).unwrap();

        let v = block.values();
        assert_eq!(v.resolution, [800.0, 480.0, 0.0]);
        assert_eq!(v.time, 2.5);
        assert_eq!(v.mouse, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(v.frame, 7);
        assert_eq!(v.aa, 2);
    }

    #[test]
    fn unknown_and_mismatched_names_are_rejected() {
        let mut block = UniformBlock::default();
        assert_eq!(
            block.set("iDate", UniformValue::Float(0.0)),
            Err(UniformError::UnknownName("iDate".into()))
        );

        let err = block.set("iFrame", UniformValue::Float(1.0)).unwrap_err();
        assert_eq!(err.to_string(), "uniform `iFrame` is a int, got a float");
    }

    #[test]
    fn every_listed_name_is_settable() {
        for name in UNIFORM_NAMES {
            let mut block = UniformBlock::default();
            let ok = [
                UniformValue::Float(1.0),
                UniformValue::Vec3([1.0; 3]),
                UniformValue::Vec4([1.0; 4]),
                UniformValue::Int(1),
            ]
            .into_iter()
            .filter(|v| block.set(name, *v).is_ok())
            .count();
            assert_eq!(ok, 1, "{name} should accept exactly one value type");
        }
    }

    #[test]
    fn dirty_tracking_skips_redundant_uploads() {
        let mut block = UniformBlock::default();
        assert!(block.take_dirty().is_some());
        assert!(block.take_dirty().is_none());

        block.set_aa(1);
        assert!(!block.is_dirty(), "AA already defaults to 1");

        block.set_time(3.0);
        assert_eq!(block.take_dirty().map(|g| g.time), Some(3.0));
        assert!(!block.is_dirty());

        block.set_flip_y(true);
        assert_eq!(block.take_dirty().map(|g| g.flip_y), Some(1));
    }
}
