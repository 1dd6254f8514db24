//! Capability interface the reader widget drives.
//!
//! The browser build binds the Recogito library (see [`crate::recogito`]);
//! tests use an in-memory engine.

use std::rc::Rc;

use async_trait::async_trait;
use shared_types::{Annotation, AnnotationSet};
use thiserror::Error;

use crate::widget::state::EngineCommand;

/// Called for each annotation the engine paints. Returns the CSS class to
/// paint with and may rewrite the annotation's `style`.
pub type Formatter = Rc<dyn Fn(&mut Annotation) -> String>;

/// Called after every change the reader makes to the set.
pub type MutationListener = Rc<dyn Fn(MutationKind)>;

/// What changed. Listeners re-read the whole set; no diff is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("annotation engine has not been rendered")]
    NotRendered,
    #[error("annotation engine is read-only")]
    ReadOnly,
    #[error("annotation payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("annotation library: {0}")]
    Script(String),
}

#[async_trait(?Send)]
pub trait AnnotationEngine {
    /// Attach to the element with id `content_id` and paint with `formatter`.
    fn render(&mut self, content_id: &str, formatter: Formatter) -> Result<(), EngineError>;

    /// The full current set, as the engine would serialize it.
    fn annotations(&self) -> Result<AnnotationSet, EngineError>;

    /// Replace everything shown with `set`. Resolves once every annotation
    /// in it has been painted.
    async fn set_annotations(&mut self, set: &AnnotationSet) -> Result<(), EngineError>;

    fn on_mutate(&mut self, listener: MutationListener);

    fn apply(&mut self, command: EngineCommand) -> Result<(), EngineError>;
}
