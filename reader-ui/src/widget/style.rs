//! Style tagging for painted annotations.
//!
//! While a fetched set is loading, each annotation keeps the style it was
//! saved with. Once ready, new and edited annotations take the style of the
//! current mode and carry it in their payload.

use shared_types::{Annotation, Palette, DEFAULT_ANNOTATION_STYLE};

use super::state::{LoadPhase, Mode, WidgetState};

/// Loading phase: the annotation's stored style, untouched.
pub fn apply_loaded_style(annotation: &Annotation) -> &str {
    annotation
        .style
        .as_deref()
        .unwrap_or(DEFAULT_ANNOTATION_STYLE)
}

/// Ready phase: the palette class when highlighting, otherwise the default.
pub fn compute_current_style(mode: Mode, color_index: usize, palette: &Palette) -> &'static str {
    match mode {
        Mode::Highlight => palette
            .get(color_index)
            .map(|c| c.class_name)
            .unwrap_or(DEFAULT_ANNOTATION_STYLE),
        Mode::ReadOnly | Mode::Annotate => DEFAULT_ANNOTATION_STYLE,
    }
}

/// The formatter the engine runs for every annotation it paints. Returns
/// the class to paint with. In the ready phase the class is also written
/// into the annotation's `style` so it is saved with the payload.
pub fn format_annotation(state: WidgetState, palette: &Palette, annotation: &mut Annotation) -> String {
    match state.phase {
        LoadPhase::Loading => apply_loaded_style(annotation).to_string(),
        LoadPhase::Ready => {
            let class = compute_current_style(state.mode, state.color_index, palette);
            annotation.style = Some(class.to_string());
            class.to_string()
        }
    }
}
