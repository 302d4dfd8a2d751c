//! Property introspection and addressing for a loaded scheme.
//!
//! A [`Project`] owns the live tree of one package's scheme and scopes
//! lookups to its current window; [`PropertyResolver`] turns registry
//! metadata plus live element state into the property set an editor shows.

pub mod project;
pub mod properties;

pub use project::Project;
pub use project::WINDOW_TAG;
pub use properties::DATA_PREFIX;
pub use properties::PropertyMap;
pub use properties::PropertyResolver;
pub use properties::ResolvedProperty;
pub use properties::Subject;
pub use properties::TypedPropertyMap;
