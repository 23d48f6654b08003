//! Typed descriptor properties

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

/// Value of a descriptor property, tagged with its declared type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PropertyValue {
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl PropertyValue {
    /// Name used in the `<Type>` element
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::String(_) => "String",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(n) => write!(f, "{n}"),
            PropertyValue::Boolean(b) => write!(f, "{b}"),
            PropertyValue::String(s) => f.write_str(&xml_escape(s)),
        }
    }
}

/// One `<Property>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::Integer(value),
        }
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::Boolean(value),
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PropertyValue::String(value.into()),
        }
    }
}

/// Render a property list, each block indented by `indent` spaces
#[must_use]
pub fn render_list(properties: &[Property], indent: usize) -> String {
    let pad = " ".repeat(indent);
    let mut out = String::new();
    for p in properties {
        let _ = writeln!(out, "{pad}<Property>");
        let _ = writeln!(out, "{pad}  <Name>{}</Name>", xml_escape(&p.name));
        let _ = writeln!(out, "{pad}  <Value>{}</Value>", p.value);
        let _ = writeln!(out, "{pad}  <Type>{}</Type>", p.value.type_name());
        let _ = writeln!(out, "{pad}</Property>");
    }
    out
}

/// Escape text for an XML element body
#[must_use]
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
