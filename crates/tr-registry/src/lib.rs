//! Widget-type registry for scheme elements.
//!
//! Every tag the builder knows is described by a [`WidgetDescriptor`]: whether
//! it is a container (and which slot tag wraps its children), its icon, its
//! declared property defaults and the type of each property. The builtin
//! catalogue is built once on first use and is read-only afterwards.

mod builtins;
pub mod descriptor;
pub mod value;

use indexmap::IndexMap;
use serde::Serialize;
use std::sync::LazyLock;

pub use descriptor::ComputedProperty;
pub use descriptor::ContainerKind;
pub use descriptor::DescriptorPatch;
pub use descriptor::PropertyDefault;
pub use descriptor::WidgetDescriptor;
pub use descriptor::apply_defaults;
pub use value::PropertyKind;
pub use value::PropertyType;
pub use value::PropertyValue;
pub use value::UNKNOWN_TYPE;

static BUILTIN: LazyLock<Registry> = LazyLock::new(|| {
    let mut registry = Registry::new();
    builtins::register_builtins(&mut registry);
    registry
});

/// Palette group a widget is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetCategory {
    Window,
    Containers,
    Media,
    Inputs,
    Views,
    Misc,
}

impl WidgetCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Containers => "containers",
            Self::Media => "media",
            Self::Inputs => "inputs",
            Self::Views => "views",
            Self::Misc => "misc",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub tag: String,
    pub category: WidgetCategory,
    pub descriptor: WidgetDescriptor,
}

/// Tag name to descriptor mapping, kept in registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: IndexMap<String, RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The builtin widget catalogue.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    pub fn register(&mut self, tag: &str, category: WidgetCategory, descriptor: WidgetDescriptor) {
        self.register_owned(tag.to_owned(), category, descriptor);
    }

    pub fn register_owned(
        &mut self,
        tag: String,
        category: WidgetCategory,
        descriptor: WidgetDescriptor,
    ) {
        self.entries.insert(
            tag.clone(),
            RegistryEntry {
                tag,
                category,
                descriptor,
            },
        );
    }

    pub fn lookup(&self, tag: &str) -> Option<&WidgetDescriptor> {
        self.entries.get(tag).map(|entry| &entry.descriptor)
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Editable (non-`skip`) tags grouped by category, in registration order.
    pub fn palette(&self) -> Vec<(WidgetCategory, Vec<&str>)> {
        let mut groups: Vec<(WidgetCategory, Vec<&str>)> = Vec::new();
        for entry in self.entries.values().filter(|entry| !entry.descriptor.skip) {
            match groups.iter_mut().find(|(category, _)| *category == entry.category) {
                Some((_, tags)) => tags.push(entry.tag.as_str()),
                None => groups.push((entry.category, vec![entry.tag.as_str()])),
            }
        }
        groups
    }
}

/// Looks `tag` up in the builtin catalogue.
pub fn lookup(tag: &str) -> Option<&'static WidgetDescriptor> {
    Registry::builtin().lookup(tag)
}
