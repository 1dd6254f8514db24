//! Annotation widget: the mode state machine and style contract wired to an
//! [`AnnotationEngine`].

pub mod state;
pub mod style;

use std::cell::Cell;
use std::rc::Rc;

use shared_types::{Annotation, Palette};

use crate::engine::{AnnotationEngine, EngineError, Formatter, MutationListener};
use crate::sync::decode_fetched;
use state::{step, EngineCommand, WidgetEvent, WidgetState};
use style::format_annotation;

/// Element the engine paints over; the server renders the page body into it.
pub const CONTENT_ELEMENT_ID: &str = "main-content";

/// Clones share the mode state, so a clone can await a load while the
/// toolbar keeps dispatching on the original.
#[derive(Clone)]
pub struct ReaderWidget<E> {
    engine: E,
    state: Rc<Cell<WidgetState>>,
    palette: Palette,
}

impl<E: AnnotationEngine> ReaderWidget<E> {
    pub fn new(engine: E, palette: Palette) -> Self {
        Self {
            engine,
            state: Rc::new(Cell::new(WidgetState::default())),
            palette,
        }
    }

    /// Render the engine over `content_id`, read-only until the reader picks
    /// a mode.
    pub fn mount(&mut self, content_id: &str) -> Result<(), EngineError> {
        let state = Rc::clone(&self.state);
        let palette = self.palette;
        let formatter: Formatter = Rc::new(move |annotation: &mut Annotation| {
            format_annotation(state.get(), &palette, annotation)
        });
        self.engine.render(content_id, formatter)?;
        self.engine.apply(EngineCommand::SetReadOnly(true))
    }

    pub fn state(&self) -> WidgetState {
        self.state.get()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn dispatch(&mut self, event: WidgetEvent) -> Result<WidgetState, EngineError> {
        let transition = step(self.state.get(), event);
        self.state.set(transition.state);
        for command in transition.commands {
            self.engine.apply(command)?;
        }
        Ok(transition.state)
    }

    /// Hand a fetched payload to the engine. Stored styles are kept until
    /// the engine has painted the whole set. Returns how many annotations
    /// were loaded.
    pub async fn load(&mut self, payload: Option<&str>) -> Result<usize, EngineError> {
        let set = decode_fetched(payload);
        self.dispatch(WidgetEvent::BeginLoad)?;
        let painted = self.engine.set_annotations(&set).await;
        self.dispatch(WidgetEvent::FinishLoad)?;
        painted.map(|()| set.len())
    }

    /// The whole current set, serialized for upload.
    pub fn payload(&self) -> Result<String, EngineError> {
        Ok(self.engine.annotations()?.encode()?)
    }

    pub fn on_mutate(&mut self, listener: MutationListener) {
        self.engine.on_mutate(listener);
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}
