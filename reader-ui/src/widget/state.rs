//! Toolbar mode state machine.
//!
//! `step` is pure: it takes the current state and one user or loader event
//! and returns the next state plus the engine commands that make the engine
//! match it.

use shared_types::HIGHLIGHT_COLORS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    ReadOnly,
    Highlight,
    Annotate,
}

/// Whether the engine is being handed a fetched payload (`Loading`) or is
/// painting annotations the reader makes (`Ready`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    Loading,
    #[default]
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WidgetState {
    pub mode: Mode,
    /// Index into the highlight palette; kept while not highlighting.
    pub color_index: usize,
    pub phase: LoadPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    ToggleHighlight,
    ToggleAnnotate,
    SelectColor(usize),
    BeginLoad,
    FinishLoad,
}

/// Instructions for the annotation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    SetReadOnly(bool),
    SetEditorDisabled(bool),
    /// Close an open editor that holds no content yet.
    DismissEmptyEditor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: WidgetState,
    pub commands: Vec<EngineCommand>,
}

pub fn step(state: WidgetState, event: WidgetEvent) -> Transition {
    match event {
        WidgetEvent::ToggleHighlight => {
            let target = if state.mode == Mode::Highlight {
                Mode::ReadOnly
            } else {
                Mode::Highlight
            };
            switch_mode(state, target)
        }
        WidgetEvent::ToggleAnnotate => {
            let target = if state.mode == Mode::Annotate {
                Mode::ReadOnly
            } else {
                Mode::Annotate
            };
            switch_mode(state, target)
        }
        WidgetEvent::SelectColor(index) if index >= HIGHLIGHT_COLORS.len() => unchanged(state),
        WidgetEvent::SelectColor(index) => match state.mode {
            Mode::Highlight if index == state.color_index => switch_mode(state, Mode::ReadOnly),
            Mode::Highlight => unchanged(WidgetState {
                color_index: index,
                ..state
            }),
            Mode::ReadOnly | Mode::Annotate => switch_mode(
                WidgetState {
                    color_index: index,
                    ..state
                },
                Mode::Highlight,
            ),
        },
        WidgetEvent::BeginLoad => unchanged(WidgetState {
            phase: LoadPhase::Loading,
            ..state
        }),
        WidgetEvent::FinishLoad => unchanged(WidgetState {
            phase: LoadPhase::Ready,
            ..state
        }),
    }
}

fn unchanged(state: WidgetState) -> Transition {
    Transition {
        state,
        commands: Vec::new(),
    }
}

fn switch_mode(state: WidgetState, target: Mode) -> Transition {
    let mut commands = Vec::with_capacity(3);
    if state.mode == Mode::Highlight && target != Mode::Highlight {
        commands.push(EngineCommand::DismissEmptyEditor);
    }
    match target {
        Mode::Highlight => {
            commands.push(EngineCommand::SetEditorDisabled(true));
            commands.push(EngineCommand::SetReadOnly(false));
        }
        Mode::Annotate => {
            commands.push(EngineCommand::SetEditorDisabled(false));
            commands.push(EngineCommand::SetReadOnly(false));
        }
        Mode::ReadOnly => commands.push(EngineCommand::SetReadOnly(true)),
    }
    Transition {
        state: WidgetState {
            mode: target,
            ..state
        },
        commands,
    }
}
