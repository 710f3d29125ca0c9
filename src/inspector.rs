//! Property inspector for [`Texture`] objects: one editable control per
//! runtime property, each edit written back and reported through a generic
//! property-changed notification.

use std::f32::consts::TAU;

use imgui::Ui;

use crate::texture::{SamplingMode, Texture, WrapMode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Float(f32),
    /// Index into the property's enumeration (wrap mode, sampling mode).
    Enum(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyChange {
    pub property: &'static str,
    pub previous: PropertyValue,
    pub value: PropertyValue,
}

pub fn draw_texture_inspector(
    ui: &Ui,
    texture: &mut Texture,
    on_change: &mut dyn FnMut(PropertyChange),
) {
    ui.window("Texture inspector").build(|| {
        ui.text(&texture.name);
        ui.separator();

        texture.level = float_control(ui, "Level", "level", texture.level, 0.0, 2.0, on_change);
        texture.has_alpha =
            bool_control(ui, "Has alpha", "has_alpha", texture.has_alpha, on_change);
        texture.invert_y = bool_control(ui, "Invert Y", "invert_y", texture.invert_y, on_change);
        texture.gamma_space =
            bool_control(ui, "Gamma space", "gamma_space", texture.gamma_space, on_change);

        ui.separator();
        texture.u_offset =
            float_control(ui, "U offset", "u_offset", texture.u_offset, -1.0, 1.0, on_change);
        texture.v_offset =
            float_control(ui, "V offset", "v_offset", texture.v_offset, -1.0, 1.0, on_change);
        texture.u_scale =
            float_control(ui, "U scale", "u_scale", texture.u_scale, 0.0, 10.0, on_change);
        texture.v_scale =
            float_control(ui, "V scale", "v_scale", texture.v_scale, 0.0, 10.0, on_change);
        texture.w_rotation =
            float_control(ui, "Rotation", "w_rotation", texture.w_rotation, 0.0, TAU, on_change);

        ui.separator();
        texture.wrap_u = enum_control(
            ui,
            "Wrap U",
            "wrap_u",
            texture.wrap_u,
            &WrapMode::ALL,
            &WrapMode::ALL.map(WrapMode::label),
            on_change,
        );
        texture.wrap_v = enum_control(
            ui,
            "Wrap V",
            "wrap_v",
            texture.wrap_v,
            &WrapMode::ALL,
            &WrapMode::ALL.map(WrapMode::label),
            on_change,
        );
        texture.sampling_mode = enum_control(
            ui,
            "Sampling",
            "sampling_mode",
            texture.sampling_mode,
            &SamplingMode::ALL,
            &SamplingMode::ALL.map(SamplingMode::label),
            on_change,
        );
    });
}

/// A control fires at most one notification per edit: only when the widget
/// was touched this frame and the edited value actually differs.
fn change(
    property: &'static str,
    previous: PropertyValue,
    value: PropertyValue,
    widget_touched: bool,
) -> Option<PropertyChange> {
    if widget_touched && value != previous {
        Some(PropertyChange {
            property,
            previous,
            value,
        })
    } else {
        None
    }
}

fn float_control(
    ui: &Ui,
    label: &str,
    property: &'static str,
    value: f32,
    min: f32,
    max: f32,
    on_change: &mut dyn FnMut(PropertyChange),
) -> f32 {
    let mut edited = value;
    let touched = ui.slider(label, min, max, &mut edited);
    if let Some(notification) = change(
        property,
        PropertyValue::Float(value),
        PropertyValue::Float(edited),
        touched,
    ) {
        on_change(notification);
    }
    edited
}

fn bool_control(
    ui: &Ui,
    label: &str,
    property: &'static str,
    value: bool,
    on_change: &mut dyn FnMut(PropertyChange),
) -> bool {
    let mut edited = value;
    let touched = ui.checkbox(label, &mut edited);
    if let Some(notification) = change(
        property,
        PropertyValue::Bool(value),
        PropertyValue::Bool(edited),
        touched,
    ) {
        on_change(notification);
    }
    edited
}

fn enum_control<T: Copy + PartialEq>(
    ui: &Ui,
    label: &str,
    property: &'static str,
    value: T,
    all: &[T],
    labels: &[&str],
    on_change: &mut dyn FnMut(PropertyChange),
) -> T {
    let previous = all.iter().position(|&entry| entry == value).unwrap_or(0);
    let mut index = previous;
    let touched = ui.combo_simple_string(label, &mut index, labels);
    if let Some(notification) = change(
        property,
        PropertyValue::Enum(previous),
        PropertyValue::Enum(index),
        touched,
    ) {
        on_change(notification);
    }
    all.get(index).copied().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_tables_stay_aligned() {
        assert_eq!(WrapMode::ALL.len(), WrapMode::ALL.map(WrapMode::label).len());
        for (mode, label) in WrapMode::ALL.iter().zip(WrapMode::ALL.map(WrapMode::label)) {
            assert_eq!(mode.label(), label);
        }
        assert_eq!(
            SamplingMode::ALL.map(SamplingMode::label),
            ["Nearest", "Bilinear", "Trilinear"]
        );
    }

    #[test]
    fn edited_control_fires_once_with_previous_value() {
        let mut fired = Vec::new();
        let notification = change(
            "level",
            PropertyValue::Float(1.0),
            PropertyValue::Float(0.5),
            true,
        );
        if let Some(notification) = notification {
            fired.push(notification);
        }

        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].property, "level");
        assert_eq!(fired[0].previous, PropertyValue::Float(1.0));
        assert_eq!(fired[0].value, PropertyValue::Float(0.5));
    }

    #[test]
    fn touched_but_unchanged_control_fires_nothing() {
        let notification = change(
            "has_alpha",
            PropertyValue::Bool(false),
            PropertyValue::Bool(false),
            true,
        );
        assert_eq!(notification, None);
    }

    #[test]
    fn untouched_control_fires_nothing() {
        let notification = change(
            "wrap_u",
            PropertyValue::Enum(0),
            PropertyValue::Enum(1),
            false,
        );
        assert_eq!(notification, None);
    }
}
