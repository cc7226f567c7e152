//! Resource, data source and provider schemas
//!
//! A [`Schema`] describes the attributes of a block. It is rendered into
//! the protocol representation for `GetProviderSchema` and is used to
//! conform decoded values, plan changes and validate configuration.

use crate::diagnostics::{AttributePath, Diagnostic, Diagnostics};
use crate::proto::tfplugin6;
use crate::validator::Validator;
use crate::value::Value;
use std::collections::BTreeMap;

/// Primitive and collection attribute types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number,
    /// A number that must be integral
    Int64,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// cty JSON type representation
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeType::String => serde_json::json!("string"),
            AttributeType::Number | AttributeType::Int64 => serde_json::json!("number"),
            AttributeType::Bool => serde_json::json!("bool"),
            AttributeType::List(inner) => serde_json::json!(["list", inner.to_json()]),
            AttributeType::Set(inner) => serde_json::json!(["set", inner.to_json()]),
            AttributeType::Map(inner) => serde_json::json!(["map", inner.to_json()]),
        }
    }

    fn conform(&self, value: Value) -> Value {
        match (self, value) {
            (AttributeType::List(inner), Value::List(items) | Value::Set(items)) => {
                Value::List(items.into_iter().map(|v| inner.conform(v)).collect())
            }
            (AttributeType::Set(inner), Value::List(items) | Value::Set(items)) => {
                Value::Set(items.into_iter().map(|v| inner.conform(v)).collect())
            }
            (AttributeType::Map(inner), Value::Map(entries) | Value::Object(entries)) => {
                Value::Map(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k, inner.conform(v)))
                        .collect(),
                )
            }
            (_, value) => value,
        }
    }

    fn check(&self, value: &Value, path: &AttributePath, diags: &mut Diagnostics) {
        let matches = match (self, value) {
            (_, Value::Null | Value::Unknown) => true,
            (AttributeType::String, Value::String(_)) => true,
            (AttributeType::Number, Value::Number(_)) => true,
            (AttributeType::Int64, Value::Number(n)) => n.fract() == 0.0,
            (AttributeType::Bool, Value::Bool(_)) => true,
            (AttributeType::List(inner) | AttributeType::Set(inner), Value::List(items) | Value::Set(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.check(item, &path.index(i), diags);
                }
                true
            }
            (AttributeType::Map(inner), Value::Map(entries)) => {
                for (key, item) in entries {
                    inner.check(item, &path.attribute(key.clone()), diags);
                }
                true
            }
            _ => false,
        };

        if !matches {
            diags.push(
                Diagnostic::error(
                    "Invalid Attribute Value Type",
                    format!("Attribute {} expects a value of type {}.", path, self),
                )
                .with_attribute(path.clone()),
            );
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeType::String => write!(f, "string"),
            AttributeType::Number => write!(f, "number"),
            AttributeType::Int64 => write!(f, "integer"),
            AttributeType::Bool => write!(f, "bool"),
            AttributeType::List(inner) => write!(f, "list of {}", inner),
            AttributeType::Set(inner) => write!(f, "set of {}", inner),
            AttributeType::Map(inner) => write!(f, "map of {}", inner),
        }
    }
}

/// Nesting of a nested attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    Single,
    List,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    Primitive(AttributeType),
    Nested {
        nesting: Nesting,
        attributes: Vec<Attribute>,
    },
}

/// A single schema attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// A change to this attribute forces the resource to be replaced
    pub requires_replace: bool,
    /// Keep the prior state value instead of planning an unknown one
    pub use_state_for_unknown: bool,
    pub default: Option<Value>,
    pub validators: Vec<Validator>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            requires_replace: false,
            use_state_for_unknown: false,
            default: None,
            validators: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Primitive(AttributeType::String))
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Primitive(AttributeType::Number))
    }

    pub fn int64(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Primitive(AttributeType::Int64))
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Primitive(AttributeType::Bool))
    }

    pub fn list(name: impl Into<String>, element: AttributeType) -> Self {
        Self::new(
            name,
            AttributeKind::Primitive(AttributeType::List(Box::new(element))),
        )
    }

    pub fn set(name: impl Into<String>, element: AttributeType) -> Self {
        Self::new(
            name,
            AttributeKind::Primitive(AttributeType::Set(Box::new(element))),
        )
    }

    pub fn single_nested(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self::new(
            name,
            AttributeKind::Nested {
                nesting: Nesting::Single,
                attributes,
            },
        )
    }

    pub fn list_nested(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self::new(
            name,
            AttributeKind::Nested {
                nesting: Nesting::List,
                attributes,
            },
        )
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn use_state_for_unknown(mut self) -> Self {
        self.use_state_for_unknown = true;
        self
    }

    /// Value planned when the configuration leaves the attribute unset.
    /// Implies computed.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.computed = true;
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Nested attributes, if this is a nested attribute
    pub fn nested_attributes(&self) -> Option<&[Attribute]> {
        match &self.kind {
            AttributeKind::Nested { attributes, .. } => Some(attributes),
            AttributeKind::Primitive(_) => None,
        }
    }

    fn to_proto(&self) -> tfplugin6::schema::Attribute {
        let (r#type, nested_type) = match &self.kind {
            AttributeKind::Primitive(ty) => (ty.to_json().to_string().into_bytes(), None),
            AttributeKind::Nested {
                nesting,
                attributes,
            } => {
                let nesting = match nesting {
                    Nesting::Single => tfplugin6::schema::object::NestingMode::Single,
                    Nesting::List => tfplugin6::schema::object::NestingMode::List,
                };
                (
                    Vec::new(),
                    Some(tfplugin6::schema::Object {
                        attributes: attributes.iter().map(Attribute::to_proto).collect(),
                        nesting: nesting as i32,
                        min_items: 0,
                        max_items: 0,
                    }),
                )
            }
        };

        tfplugin6::schema::Attribute {
            name: self.name.clone(),
            r#type,
            nested_type,
            description: self.description.clone(),
            required: self.required,
            optional: self.optional,
            computed: self.computed,
            sensitive: self.sensitive,
            description_kind: tfplugin6::StringKind::Markdown as i32,
            deprecated: false,
        }
    }

    fn conform(&self, value: Value) -> Value {
        match &self.kind {
            AttributeKind::Primitive(ty) => ty.conform(value),
            AttributeKind::Nested {
                nesting: Nesting::Single,
                attributes,
            } => conform_object(attributes, value),
            AttributeKind::Nested {
                nesting: Nesting::List,
                attributes,
            } => match value {
                Value::List(items) | Value::Set(items) => Value::List(
                    items
                        .into_iter()
                        .map(|v| conform_object(attributes, v))
                        .collect(),
                ),
                other => other,
            },
        }
    }

    fn validate(&self, value: &Value, path: &AttributePath, diags: &mut Diagnostics) {
        if value.is_unknown() {
            return;
        }

        if value.is_null() {
            if self.required {
                diags.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!("The argument \"{}\" is required, but no definition was found.", path),
                    )
                    .with_attribute(path.clone()),
                );
            }
            return;
        }

        if self.computed && !self.optional && !self.required {
            diags.push(
                Diagnostic::error(
                    "Invalid Configuration for Read-Only Attribute",
                    format!("Cannot set value for attribute {}, it is computed only.", path),
                )
                .with_attribute(path.clone()),
            );
            return;
        }

        match &self.kind {
            AttributeKind::Primitive(ty) => ty.check(value, path, diags),
            AttributeKind::Nested {
                nesting: Nesting::Single,
                attributes,
            } => validate_object(attributes, value, path, diags),
            AttributeKind::Nested {
                nesting: Nesting::List,
                attributes,
            } => {
                if let Some(items) = value.as_list() {
                    for (i, item) in items.iter().enumerate() {
                        validate_object(attributes, item, &path.index(i), diags);
                    }
                }
            }
        }

        for validator in &self.validators {
            validator.validate(value, path, diags);
        }
    }
}

/// Restrict an object to the given attributes, filling missing ones with null
fn conform_object(attributes: &[Attribute], value: Value) -> Value {
    let mut entries = match value {
        Value::Object(entries) | Value::Map(entries) => entries,
        other => return other,
    };

    let conformed: BTreeMap<String, Value> = attributes
        .iter()
        .map(|attr| {
            let value = entries.remove(&attr.name).unwrap_or_default();
            (attr.name.clone(), attr.conform(value))
        })
        .collect();

    Value::Object(conformed)
}

fn validate_object(
    attributes: &[Attribute],
    value: &Value,
    path: &AttributePath,
    diags: &mut Diagnostics,
) {
    for attr in attributes {
        attr.validate(value.attr(&attr.name), &path.attribute(attr.name.clone()), diags);
    }
}

/// Schema of a provider, resource or data source block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub version: i64,
    pub description: String,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            version: 0,
            description: String::new(),
            attributes,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Shape a decoded value after the schema: unknown attributes are
    /// dropped, missing ones become null and collections take their
    /// declared kind.
    pub fn conform(&self, value: Value) -> Value {
        conform_object(&self.attributes, value)
    }

    /// Check a configuration value against the schema
    pub fn validate(&self, config: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if config.is_null() || config.is_unknown() {
            return diags;
        }
        validate_object(&self.attributes, config, &AttributePath::default(), &mut diags);
        diags
    }

    pub fn to_proto(&self) -> tfplugin6::Schema {
        tfplugin6::Schema {
            version: self.version,
            block: Some(tfplugin6::schema::Block {
                version: self.version,
                attributes: self.attributes.iter().map(Attribute::to_proto).collect(),
                block_types: Vec::new(),
                description: self.description.clone(),
                description_kind: tfplugin6::StringKind::Markdown as i32,
                deprecated: false,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elastic_ip_schema() -> Schema {
        Schema::new(vec![
            Attribute::int64("id").computed(),
            Attribute::int64("location_id").required(),
            Attribute::string("public_ip").computed(),
            Attribute::set("tags", AttributeType::String).optional(),
            Attribute::single_nested(
                "attachment",
                vec![
                    Attribute::int64("id").computed(),
                    Attribute::string("name").computed(),
                ],
            )
            .computed(),
        ])
    }

    #[test]
    fn test_type_json() {
        assert_eq!(AttributeType::Int64.to_json(), serde_json::json!("number"));
        assert_eq!(
            AttributeType::Set(Box::new(AttributeType::String)).to_json(),
            serde_json::json!(["set", "string"])
        );
    }

    #[test]
    fn test_conform_drops_and_fills() {
        let value = Value::object([
            ("location_id", Value::from(1)),
            ("legacy", Value::from("gone")),
            ("tags", Value::List(vec![Value::from("b"), Value::from("a")])),
            ("attachment", Value::object([("id", Value::from(4))])),
        ]);

        let conformed = elastic_ip_schema().conform(value);
        let attrs = conformed.as_object().unwrap();

        assert_eq!(attrs.len(), 5);
        assert!(attrs["id"].is_null());
        assert!(!attrs.contains_key("legacy"));
        assert!(matches!(attrs["tags"], Value::Set(_)));
        assert!(attrs["attachment"].attr("name").is_null());
        assert_eq!(attrs["attachment"].attr("id").as_i64(), Some(4));
    }

    #[test]
    fn test_validate_required_and_read_only() {
        let schema = elastic_ip_schema();

        let diags = schema.validate(&schema.conform(Value::object([(
            "public_ip",
            Value::from("1.2.3.4"),
        )])));
        let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();

        assert_eq!(
            summaries,
            vec![
                "Missing required argument",
                "Invalid Configuration for Read-Only Attribute"
            ]
        );
    }

    #[test]
    fn test_validate_skips_unknown() {
        let schema = elastic_ip_schema();
        let diags = schema.validate(&schema.conform(Value::object([(
            "location_id",
            Value::Unknown,
        )])));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_validate_integer_type() {
        let schema = elastic_ip_schema();
        let diags = schema.validate(&schema.conform(Value::object([(
            "location_id",
            Value::from(1.5),
        )])));
        assert!(diags.has_error());
        assert_eq!(
            diags.iter().next().unwrap().attribute,
            Some(AttributePath::root("location_id"))
        );
    }

    #[test]
    fn test_nested_proto() {
        let proto = elastic_ip_schema().to_proto();
        let block = proto.block.unwrap();
        let attachment = block
            .attributes
            .iter()
            .find(|a| a.name == "attachment")
            .unwrap();

        assert!(attachment.r#type.is_empty());
        let nested = attachment.nested_type.as_ref().unwrap();
        assert_eq!(
            nested.nesting,
            tfplugin6::schema::object::NestingMode::Single as i32
        );
        assert_eq!(nested.attributes.len(), 2);

        let id = block.attributes.iter().find(|a| a.name == "id").unwrap();
        assert_eq!(id.r#type, b"\"number\"");
    }
}
