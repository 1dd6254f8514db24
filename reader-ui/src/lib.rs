pub mod api;
pub mod components;
pub mod engine;
pub mod page;
pub mod recogito;
pub mod sync;
pub mod widget;

pub use components::*;
pub use engine::{AnnotationEngine, EngineError, MutationKind};
pub use sync::{SyncClient, SyncStatus};
pub use widget::ReaderWidget;
