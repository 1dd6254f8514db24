use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use shared_types::Palette;

use crate::engine::{AnnotationEngine, MutationKind};
use crate::page;
use crate::recogito::RecogitoEngine;
use crate::sync::{SyncClient, SyncStatus};
use crate::widget::state::{Mode, WidgetEvent, WidgetState};
use crate::widget::{ReaderWidget, CONTENT_ELEMENT_ID};

type SharedWidget = Rc<RefCell<Option<ReaderWidget<RecogitoEngine>>>>;

/// Highlight color menu, annotate toggle and save status for the page.
#[component]
pub fn ReaderToolbar() -> Element {
    let status = use_signal(|| SyncStatus::Loading);
    let mut widget_state = use_signal(WidgetState::default);
    let mut menu_open = use_signal(|| false);
    let widget: SharedWidget = use_hook(|| Rc::new(RefCell::new(None)));

    use_hook({
        let widget = widget.clone();
        move || start_reader(widget, status)
    });

    let dispatch = use_callback({
        let widget = widget.clone();
        move |event: WidgetEvent| {
            let mut guard = widget.borrow_mut();
            let Some(reader) = guard.as_mut() else {
                return;
            };
            match reader.dispatch(event) {
                Ok(state) => widget_state.set(state),
                Err(e) => log::error!("Annotation engine rejected {event:?}: {e}"),
            }
        }
    });

    let state = widget_state();
    let palette = Palette::default();
    let highlighting = state.mode == Mode::Highlight;
    let annotating = state.mode == Mode::Annotate;
    let status_label = status().label();
    let status_class = if status().is_error() {
        "sync-status sync-error"
    } else {
        "sync-status"
    };

    rsx! {
        div { class: "reader-controls",
            div { class: "dropdown",
                button {
                    id: "highlight-button",
                    class: if highlighting { "btn dropdown-toggle active" } else { "btn dropdown-toggle" },
                    onclick: move |e| {
                        e.stop_propagation();
                        menu_open.set(!menu_open());
                    },
                    "Highlight"
                }
                if menu_open() {
                    div { id: "color-dropdown-items", class: "dropdown-menu",
                        for (index, color) in palette.iter().enumerate() {
                            button {
                                key: "{color.name}",
                                id: "{color.name}",
                                class: if highlighting && state.color_index == index { "dropdown-item selected" } else { "dropdown-item" },
                                onclick: move |_| {
                                    menu_open.set(false);
                                    dispatch.call(WidgetEvent::SelectColor(index));
                                },
                                div { class: "highlight_button {color.class_name}", "{color.name}" }
                            }
                        }
                        if highlighting {
                            button {
                                class: "dropdown-item",
                                onclick: move |_| {
                                    menu_open.set(false);
                                    dispatch.call(WidgetEvent::ToggleHighlight);
                                },
                                "Stop highlighting"
                            }
                        }
                    }
                }
            }
            button {
                id: "annotateButton",
                class: if annotating { "btn active" } else { "btn" },
                onclick: move |_| dispatch.call(WidgetEvent::ToggleAnnotate),
                "Annotate"
            }
            span { class: "{status_class}", "{status_label}" }
        }
    }
}

/// Mount the engine over the page content, subscribe uploads to edits, and
/// fetch the reader's saved set.
fn start_reader(widget: SharedWidget, mut status: Signal<SyncStatus>) {
    let Some(page) = page::current_page() else {
        log::warn!("No page information found; annotations are disabled");
        status.set(SyncStatus::LoadFailed);
        return;
    };
    let client = SyncClient::new(page, page::csrf_token());

    let mut reader = ReaderWidget::new(RecogitoEngine::new(), Palette::default());
    if let Err(e) = reader.mount(CONTENT_ELEMENT_ID) {
        log::error!("Could not start the annotation engine: {e}");
        status.set(SyncStatus::LoadFailed);
        return;
    }

    let engine = reader.engine().clone();
    let uploads = client.clone();
    reader.on_mutate(Rc::new(move |kind: MutationKind| {
        let mut status = status;
        let payload = match engine.annotations().and_then(|set| Ok(set.encode()?)) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Could not read annotations after {kind:?}: {e}");
                status.set(SyncStatus::SaveFailed);
                return;
            }
        };
        log::debug!("Annotation {kind:?}; uploading {} bytes", payload.len());
        status.set(SyncStatus::Saving);

        let client = uploads.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match client.upload(&payload).await {
                Ok(()) => status.set(SyncStatus::Synced),
                Err(e) => {
                    log::warn!("Saving annotations failed: {e}");
                    status.set(SyncStatus::SaveFailed);
                }
            }
        });
    }));
    *widget.borrow_mut() = Some(reader);

    spawn(async move {
        let fetched = client.fetch().await;
        // Painting spans several frames; load on a clone so toolbar clicks
        // can still borrow the widget meanwhile.
        let Some(mut reader) = widget.borrow().clone() else {
            return;
        };
        let loaded = match fetched {
            Ok(payload) => reader
                .load(payload.as_deref())
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e),
        };
        match loaded {
            Ok(count) => {
                log::info!("Loaded {count} annotations for {:?}", client.page());
                status.set(SyncStatus::Synced);
            }
            Err(e) => {
                log::warn!("Loading annotations failed: {e}");
                status.set(SyncStatus::LoadFailed);
            }
        }
    });
}
