//! Property schemas: a closed set of kinds, some of them recursive.

use serde_json::Value;

use crate::registry::Category;

/// Ordered named properties of an object, resource or module.
pub type Properties = Vec<(&'static str, PropertySpec)>;

/// The kind of value a property accepts.
#[derive(Debug, Clone)]
pub enum PropertyKind {
    /// A resource name: alphanumeric with dashes or underscores.
    Name,
    /// Free text.
    String,
    /// Markdown text.
    Markdown,
    /// An email address.
    Email,
    /// A media url or a `{{template}}`.
    Media,
    /// Any number.
    Number,
    /// A whole number.
    Integer,
    /// A boolean.
    Boolean,
    /// One of a fixed set of strings.
    Enum(&'static [&'static str]),
    /// `[latitude, longitude]`.
    CoordinatePair,
    /// The name of a resource in another collection.
    Reference {
        /// Target collection.
        collection: &'static str,
        /// Whether JSON null is accepted.
        nullable: bool,
        /// Values accepted without a lookup.
        special_values: &'static [&'static str],
    },
    /// An embedded resource of the given collection's type.
    NestedResource(&'static str),
    /// A list of items sharing one schema.
    List(Box<PropertySpec>),
    /// A map with schemas for keys and values.
    Dictionary {
        /// Schema of each key.
        keys: Box<PropertySpec>,
        /// Schema of each value.
        values: Box<PropertySpec>,
    },
    /// An object with named members.
    Object(Properties),
    /// A polymorphic member of a registry category, tagged by its discriminant.
    Component(Category),
    /// A string, number or boolean.
    SimpleValue,
    /// A value ref or literal.
    Lookupable,
    /// A dotted identifier path naming a value.
    SimpleAttribute,
    /// A duration shorthand such as `10s`.
    TimeOffset,
    /// A boolean expression tree built from condition modules.
    IfClause,
}

/// A property schema: its kind plus authoring metadata.
#[derive(Debug, Clone)]
pub struct PropertySpec {
    /// The accepted kind.
    pub kind: PropertyKind,
    /// Whether the property must be present.
    pub required: bool,
    /// Value assumed when absent.
    pub default: Option<Value>,
    /// Authoring help text.
    pub help: Option<&'static str>,
}

impl PropertySpec {
    /// Creates an optional property of the given kind.
    #[must_use]
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            help: None,
        }
    }

    /// Marks the property as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    #[must_use]
    pub fn name() -> Self {
        Self::new(PropertyKind::Name)
    }

    #[must_use]
    pub fn string() -> Self {
        Self::new(PropertyKind::String)
    }

    #[must_use]
    pub fn markdown() -> Self {
        Self::new(PropertyKind::Markdown)
    }

    #[must_use]
    pub fn email() -> Self {
        Self::new(PropertyKind::Email)
    }

    #[must_use]
    pub fn media() -> Self {
        Self::new(PropertyKind::Media)
    }

    #[must_use]
    pub fn number() -> Self {
        Self::new(PropertyKind::Number)
    }

    #[must_use]
    pub fn integer() -> Self {
        Self::new(PropertyKind::Integer)
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::new(PropertyKind::Boolean)
    }

    #[must_use]
    pub fn one_of(options: &'static [&'static str]) -> Self {
        Self::new(PropertyKind::Enum(options))
    }

    #[must_use]
    pub fn coordinates() -> Self {
        Self::new(PropertyKind::CoordinatePair)
    }

    /// A non-nullable reference into `collection`.
    #[must_use]
    pub fn reference(collection: &'static str) -> Self {
        Self::new(PropertyKind::Reference {
            collection,
            nullable: false,
            special_values: &[],
        })
    }

    /// A reference into `collection` that also accepts null.
    #[must_use]
    pub fn nullable_reference(collection: &'static str) -> Self {
        Self::new(PropertyKind::Reference {
            collection,
            nullable: true,
            special_values: &[],
        })
    }

    /// A reference that also accepts the given literal values.
    #[must_use]
    pub fn reference_or(collection: &'static str, special_values: &'static [&'static str]) -> Self {
        Self::new(PropertyKind::Reference {
            collection,
            nullable: false,
            special_values,
        })
    }

    #[must_use]
    pub fn nested(collection: &'static str) -> Self {
        Self::new(PropertyKind::NestedResource(collection))
    }

    #[must_use]
    pub fn list(items: PropertySpec) -> Self {
        Self::new(PropertyKind::List(Box::new(items)))
    }

    #[must_use]
    pub fn dictionary(keys: PropertySpec, values: PropertySpec) -> Self {
        Self::new(PropertyKind::Dictionary {
            keys: Box::new(keys),
            values: Box::new(values),
        })
    }

    #[must_use]
    pub fn object(properties: Properties) -> Self {
        Self::new(PropertyKind::Object(properties))
    }

    #[must_use]
    pub fn component(category: Category) -> Self {
        Self::new(PropertyKind::Component(category))
    }

    /// An ordered list of action nodes.
    #[must_use]
    pub fn actions() -> Self {
        Self::list(Self::component(Category::Actions))
    }

    #[must_use]
    pub fn simple_value() -> Self {
        Self::new(PropertyKind::SimpleValue)
    }

    #[must_use]
    pub fn lookupable() -> Self {
        Self::new(PropertyKind::Lookupable)
    }

    #[must_use]
    pub fn simple_attribute() -> Self {
        Self::new(PropertyKind::SimpleAttribute)
    }

    #[must_use]
    pub fn time_offset() -> Self {
        Self::new(PropertyKind::TimeOffset)
    }

    #[must_use]
    pub fn if_clause() -> Self {
        Self::new(PropertyKind::IfClause)
    }

    /// Short label used in error messages, e.g. `String` or `Reference`.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self.kind {
            PropertyKind::Name => "Name",
            PropertyKind::String => "String",
            PropertyKind::Markdown => "Markdown",
            PropertyKind::Email => "Email",
            PropertyKind::Media => "Media",
            PropertyKind::Number => "Number",
            PropertyKind::Integer => "Integer",
            PropertyKind::Boolean => "Boolean",
            PropertyKind::Enum(_) => "Enum",
            PropertyKind::CoordinatePair => "Coords",
            PropertyKind::Reference { .. } => "Reference",
            PropertyKind::NestedResource(_) => "Resource",
            PropertyKind::List(_) => "List",
            PropertyKind::Dictionary { .. } => "Dictionary",
            PropertyKind::Object(_) => "Object",
            PropertyKind::Component(_) => "Component",
            PropertyKind::SimpleValue => "Simple",
            PropertyKind::Lookupable => "Lookupable",
            PropertyKind::SimpleAttribute => "Attribute",
            PropertyKind::TimeOffset => "Time offset",
            PropertyKind::IfClause => "If",
        }
    }
}
