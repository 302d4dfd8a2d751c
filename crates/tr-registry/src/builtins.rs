//! The builtin widget catalogue, in palette order.

use crate::Registry;
use crate::WidgetCategory;
use crate::descriptor::ContainerKind;
use crate::descriptor::DescriptorPatch;
use crate::descriptor::WidgetDescriptor;
use crate::descriptor::box_container;
use crate::descriptor::box_slot;
use crate::descriptor::input;
use crate::descriptor::media;
use crate::value::PropertyType;
use crate::value::PropertyValue;

const UNKNOWN_MEDIA_ICON: &str = "status/dialog-question.png";

pub(crate) fn register_builtins(registry: &mut Registry) {
    use WidgetCategory::*;

    registry.register(
        "application-window",
        Window,
        WidgetDescriptor {
            skip: true,
            container: ContainerKind::Generic,
            ..WidgetDescriptor::default()
        }
        .with_property("width", PropertyValue::Null, PropertyType::number())
        .with_property("height", PropertyValue::Null, PropertyType::number()),
    );

    for (family, icon) in [
        ("gui-hbox", "widget-gtk-hbox.png"),
        ("gui-vbox", "widget-gtk-vbox.png"),
        ("gui-paned-view", "widget-gtk-hpaned.png"),
    ] {
        registry.register(family, Containers, box_container(family, icon));
        registry.register_owned(format!("{family}-container"), Containers, box_slot());
    }

    registry.register(
        "gui-tabs",
        Containers,
        WidgetDescriptor::container(
            "widget-gtk-notebook.png",
            ContainerKind::Wrapped("gui-tab-container".to_owned()),
        ),
    );
    registry.register(
        "gui-toolbar",
        Containers,
        WidgetDescriptor::container("widget-gtk-toolbar.png", ContainerKind::Generic),
    );
    registry.register(
        "gui-button-bar",
        Containers,
        WidgetDescriptor::container("widget-gtk-toolbar.png", ContainerKind::Generic),
    );

    registry.register("gui-audio", Media, media(UNKNOWN_MEDIA_ICON));
    registry.register("gui-video", Media, media(UNKNOWN_MEDIA_ICON));
    registry.register("gui-image", Media, media("widget-gtk-image.png"));
    registry.register(
        "gui-canvas",
        Media,
        WidgetDescriptor::leaf("widget-gtk-drawingarea.png"),
    );

    registry.register(
        "gui-label",
        Inputs,
        input("widget-gtk-label.png", true, Some("Label"), DescriptorPatch::default(), false),
    );
    for (tag, icon) in [
        ("gui-radio", "widget-gtk-radiotoolbutton.png"),
        ("gui-checkbox", "widget-gtk-radiotoolbutton.png"),
        ("gui-file-upload", "widget-gtk-filechooserbutton.png"),
        ("gui-input-modal", "widget-gtk-comboboxentry.png"),
        ("gui-select", "widget-gtk-combobox.png"),
        ("gui-select-list", "widget-gtk-list.png"),
        ("gui-slider", "widget-gtk-hscale.png"),
        ("gui-switch", "widget-gtk-togglebutton.png"),
        ("gui-text", "widget-gtk-entry.png"),
        ("gui-password", "widget-gtk-entry.png"),
        ("gui-textarea", "widget-gtk-textview.png"),
    ] {
        registry.register(tag, Inputs, input(icon, false, None, DescriptorPatch::default(), false));
    }
    registry.register(
        "gui-button",
        Inputs,
        input(
            "widget-gtk-button.png",
            true,
            Some("Button"),
            DescriptorPatch {
                has_inner_label: Some(true),
                ..DescriptorPatch::default()
            },
            true,
        ),
    );
    registry.register(
        "gui-richtext",
        Inputs,
        WidgetDescriptor::leaf("widget-gtk-textview.png").with_property(
            "value",
            "",
            PropertyType::string(),
        ),
    );

    registry.register("gui-tree-view", Views, WidgetDescriptor::leaf("widget-gtk-treeview.png"));
    registry.register("gui-icon-view", Views, WidgetDescriptor::leaf("widget-gtk-iconview.png"));
    registry.register("gui-list-view", Views, WidgetDescriptor::leaf("widget-gtk-list.png"));
    registry.register("gui-file-view", Views, WidgetDescriptor::leaf("widget-gtk-filefilter.png"));

    registry.register("gui-iframe", Misc, media("widget-gtk-custom.png"));
    registry.register(
        "gui-progress-bar",
        Misc,
        WidgetDescriptor::leaf("widget-gtk-progressbar.png").with_property(
            "progress",
            0.0,
            PropertyType::number().with_range(0.0, 100.0),
        ),
    );
    registry.register("gui-color-box", Misc, WidgetDescriptor::leaf("widget-gtk-colorbutton.png"));
    registry.register(
        "gui-color-swatch",
        Misc,
        WidgetDescriptor::leaf("widget-gtk-colorselection.png"),
    );
    registry.register(
        "gui-menu",
        Misc,
        WidgetDescriptor::leaf("widget-gtk-menu.png").with_special(),
    );
    registry.register("gui-menu-entry", Misc, WidgetDescriptor::structural());
    registry.register("gui-menu-bar", Misc, WidgetDescriptor::leaf("widget-gtk-menubar.png"));
    registry.register("gui-menu-bar-entry", Misc, WidgetDescriptor::structural());
    registry.register(
        "gui-statusbar",
        Misc,
        WidgetDescriptor::leaf("widget-gtk-statusbar.png").with_property(
            "value",
            "",
            PropertyType::string(),
        ),
    );
}
