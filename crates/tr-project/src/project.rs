//! The loaded scheme of one package and window-relative addressing.

use crate::properties::PropertyMap;
use crate::properties::PropertyResolver;
use crate::properties::Subject;
use crate::properties::TypedPropertyMap;
use tr_core::TrellisResult;
use tr_dom::Document;
use tr_dom::NodeId;
use tr_markup::Scheme;
use tr_markup::SchemeOptions;
use tr_path::ElementAddress;
use tr_path::PathStep;
use tr_registry::PropertyValue;
use tr_registry::WidgetDescriptor;
use tr_storage::FileRef;
use tr_storage::SchemeStorage;

/// Tag of the top-level window elements of a scheme.
pub const WINDOW_TAG: &str = "application-window";

/// One editable scheme, scoped to a current window.
///
/// `current_window` is never bounds checked; accessors that depend on it
/// return `None` when it points past the loaded windows.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    scheme: Scheme,
    fragments: Vec<String>,
    current_window: usize,
}

impl Project {
    /// Creates an empty project. No storage is touched until [`Project::load`].
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, SchemeOptions::default())
    }

    pub fn with_options(name: impl Into<String>, options: SchemeOptions) -> Self {
        Self {
            name: name.into(),
            scheme: Scheme::new(options),
            fragments: Vec::new(),
            current_window: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scheme_file(&self) -> TrellisResult<FileRef> {
        FileRef::package_scheme(&self.name)
    }

    /// Reads and parses the scheme. Scheme, tree and fragment list are
    /// replaced together on success and left untouched on failure.
    pub fn load<S: SchemeStorage + ?Sized>(&mut self, storage: &S) -> TrellisResult<()> {
        let result = self.scheme_file().and_then(|file| {
            tracing::debug!(project = %self.name, %file, "loading scheme");
            let markup = storage.read_text(&file)?;
            let mut scheme = Scheme::new(self.scheme.options().clone());
            scheme.load_string(&markup)?;
            Ok(scheme)
        });

        let scheme = match result {
            Ok(scheme) => scheme,
            Err(error) => {
                tracing::warn!(project = %self.name, %error, "scheme load failed");
                return Err(error);
            }
        };

        self.fragments = scheme.document().map(collect_fragments).unwrap_or_default();
        self.scheme = scheme;
        tracing::debug!(
            project = %self.name,
            windows = self.fragments.len(),
            "scheme loaded"
        );
        Ok(())
    }

    /// Persistence is owned by the storage layer; saving always succeeds.
    pub fn save(&self) -> TrellisResult<()> {
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.scheme.document().is_some()
    }

    pub fn document(&self) -> Option<&Document> {
        self.scheme.document()
    }

    /// Live tree for the editor layer to mutate.
    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.scheme.document_mut()
    }

    pub fn current_window(&self) -> usize {
        self.current_window
    }

    pub fn set_current_window(&mut self, index: usize) {
        self.current_window = index;
    }

    /// Absolute address of the current window, `None` when the window index
    /// has no ordinal.
    pub fn window_address(&self) -> Option<ElementAddress> {
        let ordinal = self.current_window.checked_add(1)?;
        Some(ElementAddress::new(vec![
            PathStep::new(self.scheme.options().host_tag.clone(), 1),
            PathStep::new(WINDOW_TAG, ordinal),
        ]))
    }

    /// Resolves a path relative to the current window, e.g.
    /// `gui-vbox[1]/gui-vbox-container[2]/gui-button[1]`. A leading `/` is
    /// ignored and an empty path selects the window.
    pub fn resolve_element(&self, relative: &str) -> Option<NodeId> {
        let document = self.scheme.document()?;
        let window = self.window_address()?;
        let relative = trim_relative(relative);
        let path = if relative.is_empty() {
            window.to_string()
        } else {
            format!("{window}/{relative}")
        };
        tr_path::element_at(document, document.root(), &path)
    }

    /// Address of `node` relative to the current window; empty for the window
    /// itself and `None` for nodes outside it.
    pub fn relative_address_of(&self, node: NodeId) -> Option<ElementAddress> {
        let document = self.scheme.document()?;
        tr_path::address_of(document, node).strip_prefix(&self.window_address()?)
    }

    pub fn fragment_name(&self) -> Option<&str> {
        self.fragments.get(self.current_window).map(String::as_str)
    }

    /// Live top-level element of the current window.
    pub fn fragment(&self) -> Option<NodeId> {
        let document = self.scheme.document()?;
        let host = document.first_element_child(document.root())?;
        document.element_children(host).nth(self.current_window)
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Untyped property set of an element, or of the window itself when
    /// `relative` is `None` or empty.
    pub fn resolve_properties(
        &self,
        relative: Option<&str>,
        tag: &str,
        descriptor: &WidgetDescriptor,
    ) -> PropertyMap {
        PropertyResolver::new(tag, descriptor).resolve(self.subject(relative))
    }

    pub fn element_properties(
        &self,
        relative: Option<&str>,
        tag: &str,
        descriptor: &WidgetDescriptor,
    ) -> TypedPropertyMap {
        PropertyResolver::new(tag, descriptor).resolve_typed(self.subject(relative))
    }

    pub fn element_property(
        &self,
        relative: Option<&str>,
        tag: &str,
        descriptor: &WidgetDescriptor,
        property: &str,
    ) -> Option<PropertyValue> {
        PropertyResolver::new(tag, descriptor).property(self.subject(relative), property)
    }

    pub fn element_property_type(&self, descriptor: &WidgetDescriptor, property: &str) -> &'static str {
        descriptor.property_type_name(property)
    }

    /// Serialized markup of the live tree.
    pub fn markup(&self) -> String {
        self.scheme.html()
    }

    /// Serialized markup of one element, addressed like [`Project::resolve_element`].
    pub fn element_markup(&self, relative: &str) -> Option<String> {
        let node = self.resolve_element(relative)?;
        let document = self.scheme.document()?;
        Some(tr_markup::outer_html(document, node))
    }

    fn subject(&self, relative: Option<&str>) -> Subject<'_> {
        match relative.filter(|path| !trim_relative(path).is_empty()) {
            None => Subject::Fragment {
                name: self.fragment_name(),
            },
            Some(path) => {
                let element = self.resolve_element(path).and_then(|node| {
                    self.scheme
                        .document()
                        .and_then(|document| document.element(node))
                });
                Subject::Element(element)
            }
        }
    }
}

fn trim_relative(relative: &str) -> &str {
    relative.strip_prefix('/').unwrap_or(relative)
}

fn collect_fragments(document: &Document) -> Vec<String> {
    let Some(host) = document.first_element_child(document.root()) else {
        return Vec::new();
    };

    document
        .element_children(host)
        .map(|window| match document.attribute(window, "data-id") {
            Some(id) => id.to_owned(),
            None => {
                tracing::warn!(node = window, "top-level window has no data-id");
                String::new()
            }
        })
        .collect()
}
