//! Key-path value extraction
//!
//! Decomposes structured values into scalar [`Components`] for interpolation
//! and rebuilds them afterwards, and resolves dotted key paths such as
//! `frame.origin.x` into nested fields.
//!
//! Each supported type implements [`Structured`], a fixed-arity
//! decompose/recompose contract plus named sub-fields. [`Value`] dispatches to
//! those implementations by kind.
//!
//! # Example
//!
//! ```rust
//! use drift_core::extract::{set_value_for_key_path, value_for_key_path};
//! use drift_core::{Rect, Value};
//!
//! let mut frame = Value::from(Rect::new(0.0, 0.0, 100.0, 50.0));
//! set_value_for_key_path(&mut frame, Value::from(20.0), "origin.x").unwrap();
//!
//! assert_eq!(value_for_key_path(&frame, "origin.x").unwrap(), Value::Scalar(20.0));
//! ```

use smallvec::SmallVec;

use crate::error::{KeyPathError, Result};
use crate::geometry::{Affine2D, Color, EdgeInsets, Point, Rect, Size};
use crate::value::{Components, Value, ValueKind};

/// A value type with a fixed number of scalar components and named fields
pub trait Structured: Copy {
    /// The [`ValueKind`] this type is carried as
    const KIND: ValueKind;

    /// Number of scalar components
    const ARITY: usize;

    /// Append this value's components to `out`, in a stable order
    fn push_components(&self, out: &mut Components);

    /// Rebuild from exactly [`Self::ARITY`] components
    fn from_components(components: &[f32]) -> Self;

    /// Read a named sub-field
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Replace a named sub-field. Returns `None` if the name does not resolve
    /// or `value` has the wrong kind for that field.
    fn set_field(&mut self, _name: &str, _value: Value) -> Option<()> {
        None
    }
}

impl Structured for f32 {
    const KIND: ValueKind = ValueKind::Scalar;
    const ARITY: usize = 1;

    fn push_components(&self, out: &mut Components) {
        out.push(*self);
    }

    fn from_components(components: &[f32]) -> Self {
        components[0]
    }
}

impl Structured for Point {
    const KIND: ValueKind = ValueKind::Point;
    const ARITY: usize = 2;

    fn push_components(&self, out: &mut Components) {
        out.extend_from_slice(&[self.x, self.y]);
    }

    fn from_components(c: &[f32]) -> Self {
        Point::new(c[0], c[1])
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "x" => Some(Value::Scalar(self.x)),
            "y" => Some(Value::Scalar(self.y)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Option<()> {
        let v = value.as_scalar()?;
        match name {
            "x" => self.x = v,
            "y" => self.y = v,
            _ => return None,
        }
        Some(())
    }
}

impl Structured for Size {
    const KIND: ValueKind = ValueKind::Size;
    const ARITY: usize = 2;

    fn push_components(&self, out: &mut Components) {
        out.extend_from_slice(&[self.width, self.height]);
    }

    fn from_components(c: &[f32]) -> Self {
        Size::new(c[0], c[1])
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "width" => Some(Value::Scalar(self.width)),
            "height" => Some(Value::Scalar(self.height)),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Option<()> {
        let v = value.as_scalar()?;
        match name {
            "width" => self.width = v,
            "height" => self.height = v,
            _ => return None,
        }
        Some(())
    }
}

impl Structured for Rect {
    const KIND: ValueKind = ValueKind::Rect;
    const ARITY: usize = 4;

    fn push_components(&self, out: &mut Components) {
        self.origin.push_components(out);
        self.size.push_components(out);
    }

    fn from_components(c: &[f32]) -> Self {
        Rect::new(c[0], c[1], c[2], c[3])
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "origin" => Some(Value::Point(self.origin)),
            "size" => Some(Value::Size(self.size)),
            "x" | "y" => self.origin.field(name),
            "width" | "height" => self.size.field(name),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Option<()> {
        match name {
            "origin" => self.origin = value.as_point()?,
            "size" => self.size = value.as_size()?,
            "x" | "y" => self.origin.set_field(name, value)?,
            "width" | "height" => self.size.set_field(name, value)?,
            _ => return None,
        }
        Some(())
    }
}

impl Structured for Color {
    const KIND: ValueKind = ValueKind::Color;
    const ARITY: usize = 4;

    fn push_components(&self, out: &mut Components) {
        out.extend_from_slice(&self.to_array());
    }

    fn from_components(c: &[f32]) -> Self {
        Color::rgba(c[0], c[1], c[2], c[3])
    }

    fn field(&self, name: &str) -> Option<Value> {
        let v = match name {
            "r" | "red" => self.r,
            "g" | "green" => self.g,
            "b" | "blue" => self.b,
            "a" | "alpha" => self.a,
            _ => return None,
        };
        Some(Value::Scalar(v))
    }

    fn set_field(&mut self, name: &str, value: Value) -> Option<()> {
        let v = value.as_scalar()?;
        match name {
            "r" | "red" => self.r = v,
            "g" | "green" => self.g = v,
            "b" | "blue" => self.b = v,
            "a" | "alpha" => self.a = v,
            _ => return None,
        }
        Some(())
    }
}

impl Structured for EdgeInsets {
    const KIND: ValueKind = ValueKind::Insets;
    const ARITY: usize = 4;

    fn push_components(&self, out: &mut Components) {
        out.extend_from_slice(&[self.top, self.left, self.bottom, self.right]);
    }

    fn from_components(c: &[f32]) -> Self {
        EdgeInsets::new(c[0], c[1], c[2], c[3])
    }

    fn field(&self, name: &str) -> Option<Value> {
        let v = match name {
            "top" => self.top,
            "left" => self.left,
            "bottom" => self.bottom,
            "right" => self.right,
            _ => return None,
        };
        Some(Value::Scalar(v))
    }

    fn set_field(&mut self, name: &str, value: Value) -> Option<()> {
        let v = value.as_scalar()?;
        match name {
            "top" => self.top = v,
            "left" => self.left = v,
            "bottom" => self.bottom = v,
            "right" => self.right = v,
            _ => return None,
        }
        Some(())
    }
}

const TRANSFORM_FIELDS: [&str; 6] = ["a", "b", "c", "d", "tx", "ty"];

impl Structured for Affine2D {
    const KIND: ValueKind = ValueKind::Transform;
    const ARITY: usize = 6;

    fn push_components(&self, out: &mut Components) {
        out.extend_from_slice(&self.elements);
    }

    fn from_components(c: &[f32]) -> Self {
        Affine2D {
            elements: [c[0], c[1], c[2], c[3], c[4], c[5]],
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        let index = TRANSFORM_FIELDS.iter().position(|f| *f == name)?;
        Some(Value::Scalar(self.elements[index]))
    }

    fn set_field(&mut self, name: &str, value: Value) -> Option<()> {
        let index = TRANSFORM_FIELDS.iter().position(|f| *f == name)?;
        self.elements[index] = value.as_scalar()?;
        Some(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value dispatch
// ─────────────────────────────────────────────────────────────────────────────

fn unsupported(kind: ValueKind, operation: &'static str) -> KeyPathError {
    KeyPathError::UnsupportedType { kind, operation }
}

/// Flatten a value into its scalar components
pub fn components_for_value(value: &Value) -> Result<Components> {
    let mut out = Components::new();
    match value {
        Value::Scalar(v) => v.push_components(&mut out),
        Value::Point(p) => p.push_components(&mut out),
        Value::Size(s) => s.push_components(&mut out),
        Value::Rect(r) => r.push_components(&mut out),
        Value::Color(c) => c.push_components(&mut out),
        Value::Insets(i) => i.push_components(&mut out),
        Value::Transform(t) => t.push_components(&mut out),
        Value::Flag(_) => return Err(unsupported(ValueKind::Flag, "decomposed")),
    }
    Ok(out)
}

/// Rebuild a value of `template`'s kind from a flat component slice
pub fn value_from_components(components: &[f32], template: &Value) -> Result<Value> {
    let kind = template.kind();
    let arity = kind
        .arity()
        .ok_or_else(|| unsupported(kind, "rebuilt from components"))?;
    if components.len() != arity {
        return Err(KeyPathError::ComponentCount {
            kind,
            expected: arity,
            found: components.len(),
        });
    }

    let value = match kind {
        ValueKind::Scalar => Value::Scalar(f32::from_components(components)),
        ValueKind::Point => Value::Point(Point::from_components(components)),
        ValueKind::Size => Value::Size(Size::from_components(components)),
        ValueKind::Rect => Value::Rect(Rect::from_components(components)),
        ValueKind::Color => Value::Color(Color::from_components(components)),
        ValueKind::Insets => Value::Insets(EdgeInsets::from_components(components)),
        ValueKind::Transform => Value::Transform(Affine2D::from_components(components)),
        ValueKind::Flag => return Err(unsupported(kind, "rebuilt from components")),
    };
    Ok(value)
}

/// Apply `f(index, component)` to every component, keeping the value's shape
pub fn map_components<F>(value: &Value, mut f: F) -> Result<Value>
where
    F: FnMut(usize, f32) -> f32,
{
    let mut components = components_for_value(value)?;
    for (i, c) in components.iter_mut().enumerate() {
        *c = f(i, *c);
    }
    value_from_components(&components, value)
}

fn field_of(value: &Value, name: &str) -> Result<Option<Value>> {
    Ok(match value {
        Value::Point(p) => p.field(name),
        Value::Size(s) => s.field(name),
        Value::Rect(r) => r.field(name),
        Value::Color(c) => c.field(name),
        Value::Insets(i) => i.field(name),
        Value::Transform(t) => t.field(name),
        Value::Scalar(_) | Value::Flag(_) => return Err(unsupported(value.kind(), "introspected")),
    })
}

fn set_field_of(value: &mut Value, name: &str, replacement: Value) -> Option<()> {
    match value {
        Value::Point(p) => p.set_field(name, replacement),
        Value::Size(s) => s.set_field(name, replacement),
        Value::Rect(r) => r.set_field(name, replacement),
        Value::Color(c) => c.set_field(name, replacement),
        Value::Insets(i) => i.set_field(name, replacement),
        Value::Transform(t) => t.set_field(name, replacement),
        Value::Scalar(_) | Value::Flag(_) => None,
    }
}

fn segments(path: &str) -> Result<SmallVec<[&str; 4]>> {
    let segments: SmallVec<[&str; 4]> = path.split('.').collect();
    if let Some(empty) = segments.iter().find(|s| s.is_empty()) {
        return Err(KeyPathError::not_found(path, empty));
    }
    Ok(segments)
}

/// Resolve a dotted key path inside a structured value
pub fn value_for_key_path(object: &Value, path: &str) -> Result<Value> {
    let mut current = *object;
    for segment in segments(path)? {
        current = field_of(&current, segment)?
            .ok_or_else(|| KeyPathError::not_found(path, segment))?;
    }
    Ok(current)
}

/// Write `value` through a dotted key path, preserving the object's shape
///
/// The replacement must have the same kind as the value currently stored at
/// that path.
pub fn set_value_for_key_path(object: &mut Value, value: Value, path: &str) -> Result<()> {
    let segments = segments(path)?;
    set_segments(object, value, &segments, path)
}

/// Like [`set_value_for_key_path`], returning an updated copy
pub fn with_value_for_key_path(object: &Value, value: Value, path: &str) -> Result<Value> {
    let mut copy = *object;
    set_value_for_key_path(&mut copy, value, path)?;
    Ok(copy)
}

fn set_segments(object: &mut Value, value: Value, segments: &[&str], path: &str) -> Result<()> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(KeyPathError::not_found(path, ""));
    };

    let mut child =
        field_of(object, head)?.ok_or_else(|| KeyPathError::not_found(path, head))?;

    if rest.is_empty() {
        if !child.same_shape(&value) {
            return Err(KeyPathError::ShapeMismatch {
                expected: child.kind(),
                found: value.kind(),
            });
        }
        child = value;
    } else {
        set_segments(&mut child, value, rest, path)?;
    }

    set_field_of(object, head, child).ok_or_else(|| KeyPathError::not_found(path, head))
}
