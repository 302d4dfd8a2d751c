use pretty_assertions::assert_eq;
use tr_project::Project;
use tr_registry::PropertyValue;
use tr_registry::WidgetDescriptor;
use tr_registry::lookup;
use tr_storage::FileRef;
use tr_storage::FsStorage;
use tr_storage::MemoryStorage;

const SCHEME: &str = concat!(
    "<application-window data-id=\"main\" data-width=\"640\">",
    "<gui-vbox>",
    "<gui-vbox-container><gui-text data-placeholder=\"x\"></gui-text></gui-vbox-container>",
    "<gui-vbox-container>",
    "<gui-hbox>",
    "<gui-hbox-container><gui-button data-id=\"ok\" data-label=\"OK\"></gui-button></gui-hbox-container>",
    "<gui-hbox-container><gui-progress-bar></gui-progress-bar></gui-hbox-container>",
    "</gui-hbox>",
    "</gui-vbox-container>",
    "</gui-vbox>",
    "</application-window>",
    "<application-window data-id=\"about\"><gui-label></gui-label></application-window>",
);

fn descriptor(tag: &str) -> &'static WidgetDescriptor {
    lookup(tag).unwrap_or_else(|| unreachable!("{tag} is builtin"))
}

fn storage_with(name: &str, markup: &str) -> MemoryStorage {
    let mut storage = MemoryStorage::new();
    let file = FileRef::package_scheme(name).unwrap_or_else(|_| unreachable!());
    storage.insert(file, markup);
    storage
}

fn loaded(markup: &str) -> Project {
    let mut project = Project::new("demo");
    let result = project.load(&storage_with("demo", markup));
    assert!(result.is_ok(), "{result:?}");
    project
}

#[test]
fn failed_read_leaves_project_empty() {
    let mut project = Project::new("demo");
    let result = project.load(&MemoryStorage::new());

    assert_eq!(result.map_err(|e| e.code), Err("storage.not_found"));
    assert!(project.fragments().is_empty());
    assert!(project.document().is_none());
    assert!(!project.is_loaded());
    assert_eq!(project.markup(), "");
}

#[test]
fn load_lists_window_fragments() {
    let project = loaded(SCHEME);
    assert_eq!(project.fragments(), ["main", "about"]);
    assert_eq!(project.fragment_name(), Some("main"));
    assert!(project.save().is_ok());
}

#[test]
fn loads_from_package_directory() {
    let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
    let package = dir.path().join("packages").join("demo");
    assert!(std::fs::create_dir_all(&package).is_ok());
    assert!(std::fs::write(package.join("scheme.html"), SCHEME).is_ok());

    let storage = FsStorage::with_root(dir.path());
    let mut project = Project::new("demo");
    assert!(project.load(&storage).is_ok());
    assert_eq!(project.fragments().len(), 2);
}

#[test]
fn fragment_id_is_current_window_name() {
    let mut project = loaded(SCHEME);
    let window = descriptor("application-window");

    let props = project.resolve_properties(None, "application-window", window);
    assert_eq!(props.get("id"), Some(&PropertyValue::from("main")));
    // Window attributes are not overlaid on the fragment root.
    assert_eq!(props.get("width"), Some(&PropertyValue::Null));

    project.set_current_window(1);
    let props = project.resolve_properties(None, "application-window", window);
    assert_eq!(props.get("id"), Some(&PropertyValue::from("about")));

    project.set_current_window(7);
    assert_eq!(project.fragment_name(), None);
    assert_eq!(project.fragment(), None);
    let props = project.resolve_properties(None, "application-window", window);
    assert_eq!(props.get("id"), Some(&PropertyValue::Null));
}

#[test]
fn empty_path_resolves_window_as_fragment_root() {
    let project = loaded(SCHEME);
    let window = descriptor("application-window");

    let root = project.resolve_properties(None, "application-window", window);
    assert_eq!(project.resolve_properties(Some(""), "application-window", window), root);
    assert_eq!(project.resolve_properties(Some("/"), "application-window", window), root);
    assert_eq!(root.get("width"), Some(&PropertyValue::Null));

    let hbox = descriptor("gui-hbox");
    assert_eq!(
        project.element_property(Some(""), "gui-hbox", hbox, "_size"),
        Some(PropertyValue::Number(0.0))
    );
}

#[test]
fn window_index_without_ordinal_resolves_nothing() {
    let mut project = loaded(SCHEME);
    let Some(button) = project.resolve_element("gui-vbox[1]/gui-vbox-container[2]/gui-hbox[1]/gui-hbox-container[1]/gui-button[1]") else {
        unreachable!("button exists in the first window");
    };

    project.set_current_window(usize::MAX);
    assert_eq!(project.window_address(), None);
    assert_eq!(project.resolve_element("gui-button[1]"), None);
    assert_eq!(project.relative_address_of(button), None);
    assert_eq!(project.fragment_name(), None);

    let text = descriptor("gui-text");
    let props = project.resolve_properties(Some("gui-text[1]"), "gui-text", text);
    assert_eq!(props.get("id"), Some(&PropertyValue::Null));
}

#[test]
fn element_markup_serializes_one_subtree() {
    let project = loaded(SCHEME);
    assert_eq!(
        project.element_markup("gui-vbox[1]/gui-vbox-container[1]"),
        Some("<gui-vbox-container><gui-text data-placeholder=\"x\"></gui-text></gui-vbox-container>".to_owned())
    );
    assert_eq!(project.element_markup("gui-grid[1]"), None);
}

#[test]
fn live_attribute_overrides_default() {
    let project = loaded(SCHEME);
    let path = Some("gui-vbox[1]/gui-vbox-container[1]/gui-text[1]");
    let text = descriptor("gui-text");

    let props = project.resolve_properties(path, "gui-text", text);
    let keys: Vec<_> = props.keys().map(String::as_str).collect();
    assert_eq!(keys, ["id", "placeholder", "disabled", "value"]);
    assert_eq!(props.get("placeholder"), Some(&PropertyValue::from("x")));
    assert_eq!(props.get("id"), Some(&PropertyValue::Null));
    assert_eq!(
        project.element_property(path, "gui-text", text, "placeholder"),
        Some(PropertyValue::from("x"))
    );
}

#[test]
fn button_properties_merge_declared_and_live() {
    let project = loaded(SCHEME);
    let path = Some("gui-vbox[1]/gui-vbox-container[2]/gui-hbox[1]/gui-hbox-container[1]/gui-button[1]");
    let button = descriptor("gui-button");

    let props = project.element_properties(path, "gui-button", button);
    assert_eq!(props.get("id").map(|p| &p.value), Some(&PropertyValue::from("ok")));
    assert_eq!(props.get("label").map(|p| &p.value), Some(&PropertyValue::from("OK")));
    assert_eq!(props.get("label").map(|p| p.type_name), Some("string"));
    assert_eq!(props.get("disabled").map(|p| p.type_name), Some("boolean"));
    assert_eq!(props.get("icon").map(|p| &p.value), Some(&PropertyValue::from("")));
}

#[test]
fn size_counts_sibling_slots() {
    let project = loaded(SCHEME);
    let path = Some("gui-vbox[1]/gui-vbox-container[2]/gui-hbox[1]");
    let hbox = descriptor("gui-hbox");

    assert_eq!(
        project.element_property(path, "gui-hbox", hbox, "_size"),
        Some(PropertyValue::Number(2.0))
    );
}

#[test]
fn unresolved_address_falls_back_to_defaults() {
    let project = loaded(SCHEME);
    let text = descriptor("gui-text");

    let props = project.resolve_properties(Some("gui-grid[1]"), "gui-text", text);
    assert_eq!(props.get("id"), Some(&PropertyValue::Null));
    assert_eq!(props.get("placeholder"), Some(&PropertyValue::from("")));

    let hbox = descriptor("gui-hbox");
    assert_eq!(
        project.element_property(Some("nope[1]"), "gui-hbox", hbox, "_size"),
        Some(PropertyValue::Number(0.0))
    );
}

#[test]
fn property_types_fall_back_to_unknown() {
    let project = Project::new("demo");
    let progress = descriptor("gui-progress-bar");

    assert_eq!(project.element_property_type(progress, "progress"), "number");
    assert_eq!(project.element_property_type(progress, "id"), "string");
    assert_eq!(project.element_property_type(progress, "colour"), "unknown");
}

#[test]
fn relative_addresses_round_trip() {
    let project = loaded(SCHEME);
    let relative = "gui-vbox[1]/gui-vbox-container[2]/gui-hbox[1]/gui-hbox-container[2]/gui-progress-bar[1]";

    let Some(node) = project.resolve_element(relative) else {
        unreachable!("progress bar exists");
    };
    let address = project.relative_address_of(node);
    assert_eq!(address.map(|a| a.to_relative_string()), Some(relative.to_owned()));

    assert_eq!(project.resolve_element(&format!("/{relative}")), Some(node));
    assert_eq!(project.resolve_element(""), project.fragment());
}

#[test]
fn addresses_outside_current_window_are_not_relative() {
    let mut project = loaded(SCHEME);
    project.set_current_window(1);
    let Some(label) = project.resolve_element("gui-label[1]") else {
        unreachable!("label exists in the second window");
    };

    project.set_current_window(0);
    assert_eq!(project.relative_address_of(label), None);
}

#[test]
fn markup_round_trips() {
    let project = loaded(SCHEME);
    assert_eq!(project.markup(), SCHEME);
}

#[test]
fn edits_are_visible_in_markup_and_properties() {
    let mut project = loaded(SCHEME);
    let Some(node) = project.resolve_element("gui-vbox[1]/gui-vbox-container[1]/gui-text[1]") else {
        unreachable!("text input exists");
    };
    let Some(document) = project.document_mut() else {
        unreachable!("project is loaded");
    };
    assert!(document.set_attribute(node, "data-value", "typed").is_ok());

    assert!(project.markup().contains("data-value=\"typed\""));
    let props = project.resolve_properties(
        Some("gui-vbox[1]/gui-vbox-container[1]/gui-text[1]"),
        "gui-text",
        descriptor("gui-text"),
    );
    assert_eq!(props.get("value"), Some(&PropertyValue::from("typed")));
}

#[test]
fn failed_reload_keeps_previous_scheme() {
    let mut project = loaded(SCHEME);
    let broken = storage_with("demo", "<application-window></gui-vbox>");

    let result = project.load(&broken);
    assert_eq!(result.map_err(|e| e.code), Err("markup.unexpected_end_tag"));
    assert_eq!(project.fragments(), ["main", "about"]);
    assert_eq!(project.markup(), SCHEME);
}

#[test]
fn windows_without_id_keep_their_index() {
    let project = loaded("<application-window></application-window><application-window data-id=\"b\"></application-window>");
    assert_eq!(project.fragments(), ["", "b"]);
}

#[test]
fn typed_properties_serialize_in_resolution_order() {
    let project = loaded(SCHEME);
    let path = Some("gui-vbox[1]/gui-vbox-container[2]/gui-hbox[1]/gui-hbox-container[2]/gui-progress-bar[1]");
    let progress = descriptor("gui-progress-bar");

    let typed = project.element_properties(path, "gui-progress-bar", progress);
    let json = serde_json::to_string(&typed).unwrap_or_default();
    assert_eq!(
        json,
        r#"{"id":{"value":null,"type":"string"},"progress":{"value":0.0,"type":"number"}}"#
    );
}
