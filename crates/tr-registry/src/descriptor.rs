//! Widget descriptors and the helpers that build each widget family.

use crate::value::PropertyType;
use crate::value::PropertyValue;
use crate::value::UNKNOWN_TYPE;
use indexmap::IndexMap;
use serde::Serialize;
use serde::Serializer;
use tr_dom::Element;

/// Computes a default from the live element (if any) and the widget tag.
pub type ComputedProperty = fn(Option<Element<'_>>, &str) -> PropertyValue;

/// Declared default of a property.
#[derive(Debug, Clone)]
pub enum PropertyDefault {
    Literal(PropertyValue),
    Computed(ComputedProperty),
}

impl PropertyDefault {
    pub fn resolve(&self, element: Option<Element<'_>>, tag: &str) -> PropertyValue {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Computed(compute) => compute(element, tag),
        }
    }
}

impl From<PropertyValue> for PropertyDefault {
    fn from(value: PropertyValue) -> Self {
        Self::Literal(value)
    }
}

/// Whether a widget accepts children, and how they are wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContainerKind {
    #[default]
    Leaf,
    Generic,
    /// Children must be wrapped in the named slot element.
    Wrapped(String),
}

impl ContainerKind {
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Leaf)
    }

    pub fn slot_tag(&self) -> Option<&str> {
        match self {
            Self::Wrapped(tag) => Some(tag),
            _ => None,
        }
    }
}

// Serialized as `false`, `true` or the slot tag name.
impl Serialize for ContainerKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf => serializer.serialize_bool(false),
            Self::Generic => serializer.serialize_bool(true),
            Self::Wrapped(tag) => serializer.serialize_str(tag),
        }
    }
}

/// Registry metadata for one widget tag.
#[derive(Debug, Clone, Default)]
pub struct WidgetDescriptor {
    /// Structural tag that is never offered as an editable widget.
    pub skip: bool,
    pub container: ContainerKind,
    pub icon: Option<String>,
    /// Needs dedicated editor handling (menus).
    pub special: bool,
    pub has_inner_label: bool,
    pub properties: IndexMap<String, PropertyDefault>,
    pub property_types: IndexMap<String, PropertyType>,
}

impl WidgetDescriptor {
    pub fn leaf(icon: &str) -> Self {
        Self {
            icon: Some(icon.to_owned()),
            ..Self::default()
        }
    }

    pub fn container(icon: &str, container: ContainerKind) -> Self {
        Self {
            icon: Some(icon.to_owned()),
            container,
            ..Self::default()
        }
    }

    /// Structural entry with no icon and no properties.
    pub fn structural() -> Self {
        Self {
            skip: true,
            ..Self::default()
        }
    }

    pub fn with_property(
        mut self,
        name: &str,
        default: impl Into<PropertyDefault>,
        property_type: PropertyType,
    ) -> Self {
        self.properties.insert(name.to_owned(), default.into());
        self.property_types.insert(name.to_owned(), property_type);
        self
    }

    pub fn with_special(mut self) -> Self {
        self.special = true;
        self
    }

    /// Declared types plus the implicit `id: string`.
    pub fn effective_property_types(&self) -> IndexMap<String, PropertyType> {
        let mut implicit = IndexMap::new();
        implicit.insert("id".to_owned(), PropertyType::string());
        apply_defaults(&self.property_types, &implicit)
    }

    /// Declared type name of `property`, or `"unknown"`.
    pub fn property_type_name(&self, property: &str) -> &'static str {
        if property == "id" && !self.property_types.contains_key("id") {
            return PropertyType::string().type_name();
        }

        self.property_types
            .get(property)
            .map(PropertyType::type_name)
            .unwrap_or(UNKNOWN_TYPE)
    }

    /// Applies `patch` on top of this descriptor. Set fields of the patch win;
    /// property and type maps are merged key by key with patch entries winning.
    pub fn merged(self, patch: DescriptorPatch) -> Self {
        Self {
            skip: patch.skip.unwrap_or(self.skip),
            container: patch.container.unwrap_or(self.container),
            icon: patch.icon.or(self.icon),
            special: patch.special.unwrap_or(self.special),
            has_inner_label: patch.has_inner_label.unwrap_or(self.has_inner_label),
            properties: apply_defaults(&patch.properties, &self.properties),
            property_types: apply_defaults(&patch.property_types, &self.property_types),
        }
    }
}

impl From<&str> for PropertyDefault {
    fn from(value: &str) -> Self {
        Self::Literal(value.into())
    }
}

impl From<f64> for PropertyDefault {
    fn from(value: f64) -> Self {
        Self::Literal(value.into())
    }
}

/// Partial descriptor merged over a family template.
#[derive(Debug, Clone, Default)]
pub struct DescriptorPatch {
    pub skip: Option<bool>,
    pub container: Option<ContainerKind>,
    pub icon: Option<String>,
    pub special: Option<bool>,
    pub has_inner_label: Option<bool>,
    pub properties: IndexMap<String, PropertyDefault>,
    pub property_types: IndexMap<String, PropertyType>,
}

/// One-level merge: every key of `overrides` is kept, keys only present in
/// `base` are appended after them.
pub fn apply_defaults<V: Clone>(
    overrides: &IndexMap<String, V>,
    base: &IndexMap<String, V>,
) -> IndexMap<String, V> {
    let mut out = overrides.clone();
    for (key, value) in base {
        if !out.contains_key(key) {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}

/// Leaf widget showing external media through a `src` property.
pub fn media(icon: &str) -> WidgetDescriptor {
    WidgetDescriptor::leaf(icon).with_property("src", "", PropertyType::string())
}

/// Leaf form input. `has_label` selects a `label` property over `value`,
/// seeded with `default_value` in its type declaration.
pub fn input(
    icon: &str,
    has_label: bool,
    default_value: Option<&str>,
    extra: DescriptorPatch,
    has_icon: bool,
) -> WidgetDescriptor {
    let text_property = if has_label { "label" } else { "value" };

    let mut descriptor = WidgetDescriptor::leaf(icon)
        .with_property("disabled", PropertyValue::Null, PropertyType::boolean())
        .with_property("placeholder", "", PropertyType::string())
        .with_property(
            text_property,
            "",
            PropertyType::string().with_default(default_value.unwrap_or_default()),
        );

    if has_icon {
        descriptor = descriptor.with_property("icon", "", PropertyType::string());
    }

    descriptor.merged(extra)
}

/// Flex container of `family`; its children live in `<family>-container`
/// slots and `_size` reports how many slots exist at resolution time.
pub fn box_container(family: &str, icon: &str) -> WidgetDescriptor {
    WidgetDescriptor::container(icon, ContainerKind::Wrapped(slot_tag(family)))
        .with_property(
            "_size",
            PropertyDefault::Computed(count_family_slots),
            PropertyType::number(),
        )
}

/// Layout slot wrapping one child of a box container.
pub fn box_slot() -> WidgetDescriptor {
    WidgetDescriptor {
        skip: true,
        container: ContainerKind::Generic,
        ..WidgetDescriptor::default()
    }
    .with_property("grow", PropertyValue::Null, PropertyType::number())
    .with_property("shrink", PropertyValue::Null, PropertyType::number())
    .with_property(
        "basis",
        PropertyValue::Null,
        PropertyType::mixed(vec![PropertyValue::Null, "auto".into()]),
    )
    .with_property("expand", PropertyValue::Null, PropertyType::boolean())
    .with_property("fill", PropertyValue::Null, PropertyType::boolean())
}

pub fn slot_tag(family: &str) -> String {
    format!("{family}-container")
}

/// Counts `<tag>-container` elements below the parent of `element`.
pub fn count_family_slots(element: Option<Element<'_>>, tag: &str) -> PropertyValue {
    let Some(element) = element else {
        return PropertyValue::Number(0.0);
    };

    let slot = slot_tag(tag);
    let count = match element.parent() {
        Some(parent) => parent.elements_by_tag_name(&slot).len(),
        None => {
            let document = element.document();
            document.elements_by_tag_name(document.root(), &slot).len()
        }
    };

    PropertyValue::Number(count as f64)
}
