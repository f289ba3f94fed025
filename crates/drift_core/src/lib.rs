//! Drift Core
//!
//! Foundational types for the Drift animation engine:
//!
//! - **Geometry**: points, sizes, rects, edge insets, affine transforms, colors
//! - **Values**: the [`Value`] union of every animatable property type
//! - **Key-Path Extraction**: decompose values into scalar components, rebuild
//!   them, and resolve nested paths like `frame.origin.x`
//! - **Targets**: the [`Animatable`] trait hosts implement to expose properties
//!
//! # Example
//!
//! ```rust
//! use drift_core::{set_target_value, target_value, Point, PropertyMap, Value};
//!
//! let mut layer = PropertyMap::new().with("position", Point::new(0.0, 0.0));
//! set_target_value(&mut layer, "position.x", Value::from(12.0)).unwrap();
//!
//! assert_eq!(target_value(&layer, "position.x").unwrap(), Value::Scalar(12.0));
//! ```

pub mod error;
pub mod extract;
pub mod geometry;
pub mod target;
pub mod value;

pub use error::{KeyPathError, Result};
pub use extract::{
    components_for_value, map_components, set_value_for_key_path, value_for_key_path,
    value_from_components, with_value_for_key_path, Structured,
};
pub use geometry::{Affine2D, Color, EdgeInsets, Point, Rect, Size};
pub use target::{set_target_value, target_value, Animatable, PropertyMap};
pub use value::{Components, Value, ValueKind};
