//! Merging of registry defaults with live element state.

use indexmap::IndexMap;
use serde::Serialize;
use tr_dom::Element;
use tr_registry::PropertyType;
use tr_registry::PropertyValue;
use tr_registry::UNKNOWN_TYPE;
use tr_registry::WidgetDescriptor;
use tr_registry::apply_defaults;

/// Attribute prefix that marks element properties in scheme markup.
pub const DATA_PREFIX: &str = "data-";

pub type PropertyMap = IndexMap<String, PropertyValue>;
pub type TypedPropertyMap = IndexMap<String, ResolvedProperty>;

/// Final value of one property paired with its type name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProperty {
    pub value: PropertyValue,
    #[serde(rename = "type")]
    pub type_name: &'static str,
}

/// What properties are being resolved for.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    /// The window itself; its `id` is the fragment name and no live
    /// attributes are read.
    Fragment { name: Option<&'a str> },
    /// An element addressed inside the window, `None` when the address
    /// matched nothing.
    Element(Option<Element<'a>>),
}

impl<'a> Subject<'a> {
    fn element(&self) -> Option<Element<'a>> {
        match self {
            Self::Fragment { .. } => None,
            Self::Element(element) => *element,
        }
    }
}

/// Resolves the property set of one widget tag.
///
/// Precedence, lowest first: declared defaults (computed ones evaluated
/// against the live element), then the identity `id`, then `data-*`
/// attributes of the live element.
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver<'d> {
    tag: &'d str,
    descriptor: &'d WidgetDescriptor,
}

impl<'d> PropertyResolver<'d> {
    pub fn new(tag: &'d str, descriptor: &'d WidgetDescriptor) -> Self {
        Self { tag, descriptor }
    }

    pub fn resolve(&self, subject: Subject<'_>) -> PropertyMap {
        let element = subject.element();

        let defaults: PropertyMap = self
            .descriptor
            .properties
            .iter()
            .map(|(name, default)| (name.clone(), default.resolve(element, self.tag)))
            .collect();

        let id = match subject {
            Subject::Fragment { name } => name.map(PropertyValue::from),
            Subject::Element(element) => element
                .and_then(|el| el.attribute("data-id"))
                .map(PropertyValue::from),
        };

        let mut live = PropertyMap::new();
        live.insert("id".to_owned(), id.unwrap_or_default());

        if let Some(element) = element {
            for (name, value) in element.attributes() {
                match name.strip_prefix(DATA_PREFIX) {
                    Some(key) if !key.is_empty() => {
                        live.insert(key.to_owned(), PropertyValue::from(value.as_str()));
                    }
                    _ => {}
                }
            }
        }

        apply_defaults(&live, &defaults)
    }

    pub fn resolve_typed(&self, subject: Subject<'_>) -> TypedPropertyMap {
        let types = self.descriptor.effective_property_types();
        self.resolve(subject)
            .into_iter()
            .map(|(name, value)| {
                let type_name = types
                    .get(&name)
                    .map(PropertyType::type_name)
                    .unwrap_or(UNKNOWN_TYPE);
                (name, ResolvedProperty { value, type_name })
            })
            .collect()
    }

    /// Single property lookup; `None` when the resolved set lacks `property`.
    pub fn property(&self, subject: Subject<'_>, property: &str) -> Option<PropertyValue> {
        self.resolve(subject).shift_remove(property)
    }
}
