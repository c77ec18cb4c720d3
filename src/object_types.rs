//! Object types: named classes whose properties supply defaults for objects.

use std::collections::HashMap;

use roxmltree::Document;
use serde::Deserialize;
use tracing::debug;

use crate::color::Color;
use crate::error::{MapError, Result};
use crate::loader::json_loader::{properties_from_json, JsonProperty};
use crate::object::Object;
use crate::properties::{decode_properties, Properties, Property, RawProperty};

/// One object type and its default property values.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    /// Type name, matched against [`Object::class`].
    pub name: String,
    /// Editor display color.
    pub color: Option<Color>,
    /// Default values.
    pub properties: Properties,
}

/// Object types keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectTypes {
    types: HashMap<String, ObjectType>,
}

#[derive(Deserialize)]
struct JsonObjectType {
    name: String,
    color: Option<String>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

impl ObjectTypes {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the `<objecttypes>` XML form.
    ///
    /// Defaults are written in a `default` attribute rather than `value`.
    pub fn from_xml(text: &str) -> Result<Self> {
        let doc = Document::parse(text)?;
        let root = doc.root_element();
        if !root.has_tag_name("objecttypes") {
            return Err(MapError::MalformedDocument {
                element: root.tag_name().name().to_owned(),
                reason: "expected <objecttypes> at the root".into(),
            });
        }

        let mut out = ObjectTypes::new();
        for node in root.children().filter(|c| c.has_tag_name("objecttype")) {
            let name = node.attribute("name").ok_or_else(|| MapError::MissingAttribute {
                element: "objecttype".into(),
                attribute: "name",
            })?;
            let raw = node
                .children()
                .filter(|c| c.has_tag_name("property"))
                .map(|p| {
                    let name = p.attribute("name").ok_or_else(|| MapError::MissingAttribute {
                        element: "property".into(),
                        attribute: "name",
                    })?;
                    Ok(RawProperty {
                        name: name.to_owned(),
                        declared_type: p.attribute("type").map(str::to_owned),
                        value: p.attribute("default").map(str::to_owned),
                        body: None,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            out.insert(ObjectType {
                name: name.to_owned(),
                color: parse_color(node.attribute("color"))?,
                properties: decode_properties(raw)?,
            });
        }
        debug!(types = out.len(), "decoded object types");
        Ok(out)
    }

    /// Parses the JSON array form.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: Vec<JsonObjectType> = serde_json::from_str(text)?;
        let mut out = ObjectTypes::new();
        for t in raw {
            out.insert(ObjectType {
                color: parse_color(t.color.as_deref())?,
                properties: properties_from_json(t.properties)?,
                name: t.name,
            });
        }
        debug!(types = out.len(), "decoded object types");
        Ok(out)
    }

    /// Adds a type, replacing one with the same name.
    pub fn insert(&mut self, object_type: ObjectType) -> Option<ObjectType> {
        self.types.insert(object_type.name.clone(), object_type)
    }

    /// Looks a type up by name.
    pub fn get(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    /// Number of types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether there are no types.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The object's own value for `name`, else the default from the object's type.
    pub fn property<'a>(&'a self, object: &'a Object, name: &str) -> Option<&'a Property> {
        object.properties.get(name).or_else(|| {
            let class = object.class.as_deref()?;
            self.get(class)?.properties.get(name)
        })
    }
}

fn parse_color(text: Option<&str>) -> Result<Option<Color>> {
    text.filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| MapError::InvalidAttribute {
                element: "objecttype".into(),
                attribute: "color",
                value: s.to_owned(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;
    use glam::Vec2;

    const XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<objecttypes>
 <objecttype name="door" color="#a0a0a4">
  <property name="locked" type="bool" default="true"/>
  <property name="key" type="string" default="brass"/>
 </objecttype>
 <objecttype name="spawn" color="#ff0000"/>
</objecttypes>
"##;

    fn door(properties: Properties) -> Object {
        Object {
            id: 1,
            name: "front".into(),
            class: Some("door".into()),
            position: Vec2::ZERO,
            visible: true,
            properties,
            kind: ObjectKind::Point,
        }
    }

    #[test]
    fn parses_xml_types() {
        let types = ObjectTypes::from_xml(XML).expect("object types");
        assert_eq!(types.len(), 2);
        let door = types.get("door").expect("door");
        assert_eq!(door.color, Some(Color::rgba(0xa0, 0xa0, 0xa4, 0xff)));
        assert_eq!(door.properties.get_bool("locked"), Some(true));
        assert!(types.get("spawn").expect("spawn").properties.is_empty());
    }

    #[test]
    fn parses_json_types() {
        let json = r##"[{"name":"door","color":"#a0a0a4","properties":[{"name":"locked","type":"bool","value":true}]}]"##;
        let types = ObjectTypes::from_json(json).expect("object types");
        assert_eq!(types.get("door").and_then(|t| t.properties.get_bool("locked")), Some(true));
    }

    #[test]
    fn object_value_wins_over_type_default() {
        let types = ObjectTypes::from_xml(XML).expect("object types");

        let mut own = Properties::new();
        own.insert("locked", Property::Bool(false));
        let object = door(own);

        assert_eq!(types.property(&object, "locked"), Some(&Property::Bool(false)));
        assert_eq!(types.property(&object, "key"), Some(&Property::String("brass".into())));
        assert_eq!(types.property(&object, "missing"), None);

        let untyped = Object { class: None, ..door(Properties::new()) };
        assert_eq!(types.property(&untyped, "key"), None);
    }

    #[test]
    fn typed_default_without_value_fails() {
        let xml = r#"<objecttypes><objecttype name="x"><property name="n" type="int"/></objecttype></objecttypes>"#;
        let err = ObjectTypes::from_xml(xml).unwrap_err();
        assert!(matches!(err, MapError::PropertyHasNoValue { .. }));
    }
}
