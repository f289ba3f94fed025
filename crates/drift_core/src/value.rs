//! Animatable values
//!
//! `Value` is the tagged union of every property type the animation engine
//! can read from or write to a host object. Interpolable kinds flatten into a
//! fixed-arity [`Components`] vector; `Flag` is carried through key paths but
//! cannot be decomposed.

use std::fmt;

use smallvec::SmallVec;

use crate::geometry::{Affine2D, Color, EdgeInsets, Point, Rect, Size};

/// Flattened scalar components of one value, in a fixed per-kind order
pub type Components = SmallVec<[f32; 8]>;

/// The shape of a [`Value`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar,
    Point,
    Size,
    Rect,
    Color,
    Insets,
    Transform,
    Flag,
}

impl ValueKind {
    /// Number of scalar components, or `None` for kinds that cannot be decomposed
    pub fn arity(self) -> Option<usize> {
        match self {
            ValueKind::Scalar => Some(1),
            ValueKind::Point | ValueKind::Size => Some(2),
            ValueKind::Rect | ValueKind::Color | ValueKind::Insets => Some(4),
            ValueKind::Transform => Some(6),
            ValueKind::Flag => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Scalar => "scalar",
            ValueKind::Point => "point",
            ValueKind::Size => "size",
            ValueKind::Rect => "rect",
            ValueKind::Color => "color",
            ValueKind::Insets => "insets",
            ValueKind::Transform => "transform",
            ValueKind::Flag => "flag",
        };
        f.write_str(name)
    }
}

/// A property value on an animatable target
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Scalar(f32),
    Point(Point),
    Size(Size),
    Rect(Rect),
    Color(Color),
    Insets(EdgeInsets),
    Transform(Affine2D),
    Flag(bool),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Point(_) => ValueKind::Point,
            Value::Size(_) => ValueKind::Size,
            Value::Rect(_) => ValueKind::Rect,
            Value::Color(_) => ValueKind::Color,
            Value::Insets(_) => ValueKind::Insets,
            Value::Transform(_) => ValueKind::Transform,
            Value::Flag(_) => ValueKind::Flag,
        }
    }

    /// Check whether two values have the same kind (and so the same arity)
    pub fn same_shape(&self, other: &Value) -> bool {
        self.kind() == other.kind()
    }

    pub fn as_scalar(&self) -> Option<f32> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Value::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<Size> {
        match self {
            Value::Size(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            Value::Rect(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_insets(&self) -> Option<EdgeInsets> {
        match self {
            Value::Insets(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_transform(&self) -> Option<Affine2D> {
        match self {
            Value::Transform(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Check if two values are approximately equal, component by component
    ///
    /// Values of different kinds are never equal. Flags compare exactly.
    pub fn approx_eq(&self, other: &Value, epsilon: f32) -> bool {
        if let (Value::Flag(a), Value::Flag(b)) = (self, other) {
            return a == b;
        }
        if !self.same_shape(other) {
            return false;
        }
        match (
            crate::extract::components_for_value(self),
            crate::extract::components_for_value(other),
        ) {
            (Ok(a), Ok(b)) => a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < epsilon),
            _ => false,
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Scalar(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v as f32)
    }
}

impl From<Point> for Value {
    fn from(p: Point) -> Self {
        Value::Point(p)
    }
}

impl From<Size> for Value {
    fn from(s: Size) -> Self {
        Value::Size(s)
    }
}

impl From<Rect> for Value {
    fn from(r: Rect) -> Self {
        Value::Rect(r)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Value::Color(c)
    }
}

impl From<EdgeInsets> for Value {
    fn from(i: EdgeInsets) -> Self {
        Value::Insets(i)
    }
}

impl From<Affine2D> for Value {
    fn from(t: Affine2D) -> Self {
        Value::Transform(t)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Flag(b)
    }
}
