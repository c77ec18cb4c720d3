//! Typed custom properties.
//!
//! Tiled stores properties as loosely typed `(name, type, value)` triples. The decoder
//! here resolves where the value comes from, then coerces it into [`Property`]. A value
//! that cannot be coerced becomes [`Property::Error`] instead of failing the document.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::color::Color;
use crate::error::{MapError, Result};

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// `string` (also the type of untyped properties).
    String(String),
    /// `bool`.
    Bool(bool),
    /// `int`.
    Int(i64),
    /// `float`.
    Double(f64),
    /// `file`: a path as written in the document.
    FileRef(PathBuf),
    /// `color`.
    Color(Color),
    /// `object`: the id of another object; 0 means "no object".
    ObjectRef(u32),
    /// The value could not be coerced into its declared type.
    Error {
        /// Declared type tag, verbatim.
        declared_type: String,
        /// Raw value text.
        raw: String,
    },
}

impl Property {
    /// The type tag Tiled uses for this kind of value.
    pub fn type_name(&self) -> &str {
        match self {
            Property::String(_) => "string",
            Property::Bool(_) => "bool",
            Property::Int(_) => "int",
            Property::Double(_) => "float",
            Property::FileRef(_) => "file",
            Property::Color(_) => "color",
            Property::ObjectRef(_) => "object",
            Property::Error { declared_type, .. } => declared_type,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::String(s) => f.write_str(s),
            Property::Bool(b) => write!(f, "{b}"),
            Property::Int(i) => write!(f, "{i}"),
            Property::Double(d) => write!(f, "{d}"),
            Property::FileRef(p) => write!(f, "{}", p.display()),
            Property::Color(c) => write!(f, "{c}"),
            Property::ObjectRef(id) => write!(f, "{id}"),
            Property::Error { raw, .. } => f.write_str(raw),
        }
    }
}

/// A property bag keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: HashMap<String, Property>,
}

impl Properties {
    /// An empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property, replacing (and returning) any previous value of that name.
    pub fn insert(&mut self, name: impl Into<String>, value: Property) -> Option<Property> {
        self.values.insert(name.into(), value)
    }

    /// The value of `name`, whatever its type.
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.values.get(name)
    }

    /// Whether `name` is set.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Name/value pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Typed accessors: `None` when the property is missing or holds another type.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Property::String(s) => Some(s),
            _ => None,
        }
    }

    /// A `bool` property.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Property::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// An `int` property.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Property::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Like [`get_i64`](Self::get_i64), but `None` if the value does not fit in an `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|i| i32::try_from(i).ok())
    }

    /// A `float` property.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Property::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// A `float` property narrowed to `f32`.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.get_f64(name).map(|d| d as f32)
    }

    /// A `file` property.
    pub fn get_file(&self, name: &str) -> Option<&Path> {
        match self.get(name)? {
            Property::FileRef(p) => Some(p),
            _ => None,
        }
    }

    /// A `color` property.
    pub fn get_color(&self, name: &str) -> Option<Color> {
        match self.get(name)? {
            Property::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// An `object` property: the referenced object id.
    pub fn get_object(&self, name: &str) -> Option<u32> {
        match self.get(name)? {
            Property::ObjectRef(id) => Some(*id),
            _ => None,
        }
    }
}

impl FromIterator<(String, Property)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, Property)>>(iter: I) -> Self {
        Properties {
            values: iter.into_iter().collect(),
        }
    }
}

/// A property as read by a front end, before any typing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProperty {
    /// Property name.
    pub name: String,
    /// Declared type tag; `None` means string.
    pub declared_type: Option<String>,
    /// Value attached directly (the `value` attribute).
    pub value: Option<String>,
    /// Element body text, used for multi-line strings.
    pub body: Option<String>,
}

impl RawProperty {
    /// An untyped property with no value yet.
    pub fn new(name: impl Into<String>) -> Self {
        RawProperty {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the declared type tag.
    pub fn with_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }

    /// Sets the attached value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the body text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Decodes one raw property.
///
/// The value is the attached `value` if there is one, otherwise the body text of an
/// untyped property. A typed property with neither fails with
/// [`MapError::PropertyHasNoValue`]. Coercion failures do not fail: they produce
/// [`Property::Error`].
pub fn decode_property(raw: RawProperty) -> Result<(String, Property)> {
    let RawProperty {
        name,
        declared_type,
        value,
        body,
    } = raw;

    let text = match (value, &declared_type) {
        (Some(v), _) => v,
        (None, None) => body.unwrap_or_default(),
        (None, Some(ty)) => {
            return Err(MapError::PropertyHasNoValue {
                name,
                declared_type: ty.clone(),
            })
        }
    };

    let ty = declared_type.as_deref().unwrap_or("string");
    let value = coerce(ty, &text).unwrap_or_else(|| {
        warn!(property = %name, declared_type = ty, raw = %text, "property value does not match its type");
        Property::Error {
            declared_type: ty.to_owned(),
            raw: text.clone(),
        }
    });
    Ok((name, value))
}

/// Decodes every raw property into a bag. The first property without a value aborts.
pub fn decode_properties<I>(raw: I) -> Result<Properties>
where
    I: IntoIterator<Item = RawProperty>,
{
    let mut out = Properties::new();
    for p in raw {
        let (name, value) = decode_property(p)?;
        out.insert(name, value);
    }
    Ok(out)
}

fn coerce(ty: &str, text: &str) -> Option<Property> {
    Some(match ty {
        "string" => Property::String(text.to_owned()),
        "bool" => Property::Bool(text.trim().parse().ok()?),
        "int" => Property::Int(text.trim().parse().ok()?),
        "float" => Property::Double(text.trim().parse().ok()?),
        "file" => Property::FileRef(PathBuf::from(text)),
        "color" => Property::Color(text.parse().ok()?),
        "object" => Property::ObjectRef(text.trim().parse().ok()?),
        _ => return None,
    })
}
