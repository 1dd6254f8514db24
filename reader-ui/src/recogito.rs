//! RecogitoJS binding.
//!
//! The library is loaded from a `<script>` tag as the global `Recogito`.
//! A small inline shim owns the JS-side glue (reading and stamping `style`
//! on the library's annotation wrappers); Rust passes strings and closures.

use std::rc::Rc;

use async_trait::async_trait;
use shared_types::{Annotation, AnnotationSet};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::engine::{AnnotationEngine, EngineError, Formatter, MutationKind, MutationListener};
use crate::widget::state::EngineCommand;

const TAG_VOCABULARY: &[&str] = &["Place", "Person", "Event", "Organization", "Animal"];

/// Inject the glue functions once into the page.
/// Idempotent, guarded by `window.__reader_recogito_ready`.
fn inject_shim() -> Result<(), EngineError> {
    let js = r#"
if (!window.__reader_recogito_ready) {
  window.__reader_recogito_init = function(contentId, vocabulary, formatter) {
    return Recogito.init({
      content: contentId,
      locale: 'auto',
      readOnly: true,
      allowEmpty: true,
      formatter: function(a) {
        const u = a.underlying || a;
        const out = formatter(typeof u.style === 'string' ? u.style : undefined);
        if (typeof out[1] === 'string') u.style = out[1];
        return out[0];
      },
      widgets: [
        { widget: 'COMMENT' },
        { widget: 'TAG', vocabulary: vocabulary }
      ],
      relationVocabulary: ['isRelated', 'isPartOf', 'isSameAs']
    });
  };
  window.__reader_dismiss_empty_editor = function(reco) {
    const editor = document.querySelector('.r6o-editor');
    if (!editor) return;
    const field = editor.querySelector('textarea');
    if (field && field.value.trim() !== '') return;
    if (typeof reco.cancelSelected === 'function') {
      reco.cancelSelected();
    } else {
      reco.selectAnnotation();
    }
  };
  window.__reader_recogito_ready = true;
}
"#;
    run_script(js)
}

fn run_script(js: &str) -> Result<(), EngineError> {
    js_sys::eval(js).map_err(script_error)?;
    Ok(())
}

fn script_error(e: JsValue) -> EngineError {
    EngineError::Script(
        e.as_string()
            .or_else(|| {
                js_sys::Reflect::get(&e, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{e:?}")),
    )
}

fn global_function(name: &str) -> Result<js_sys::Function, EngineError> {
    js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(name))
        .map_err(script_error)?
        .dyn_into::<js_sys::Function>()
        .map_err(|_| EngineError::Script(format!("{name} is not loaded")))
}

/// Handle to one Recogito instance. Clones share the instance.
#[derive(Clone, Default)]
pub struct RecogitoEngine {
    reco: Option<JsValue>,
}

impl RecogitoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn instance(&self) -> Result<&JsValue, EngineError> {
        self.reco.as_ref().ok_or(EngineError::NotRendered)
    }

    fn method(&self, name: &str) -> Result<(JsValue, js_sys::Function), EngineError> {
        let reco = self.instance()?;
        let function = js_sys::Reflect::get(reco, &JsValue::from_str(name))
            .map_err(script_error)?
            .dyn_into::<js_sys::Function>()
            .map_err(|_| EngineError::Script(format!("Recogito has no method {name}")))?;
        Ok((reco.clone(), function))
    }

    fn set_flag(&self, name: &str, value: bool) -> Result<(), EngineError> {
        js_sys::Reflect::set(self.instance()?, &JsValue::from_str(name), &JsValue::from_bool(value))
            .map_err(script_error)?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl AnnotationEngine for RecogitoEngine {
    fn render(&mut self, content_id: &str, formatter: Formatter) -> Result<(), EngineError> {
        inject_shim()?;

        let vocabulary: js_sys::Array = TAG_VOCABULARY.iter().map(|t| JsValue::from_str(t)).collect();
        // The shim hands over only the stored style; that is all the
        // formatter reads or writes.
        let format = Closure::wrap(Box::new(move |stored: JsValue| -> JsValue {
            let mut annotation = Annotation {
                style: stored.as_string(),
                ..Annotation::default()
            };
            let class = formatter(&mut annotation);
            let out = js_sys::Array::new();
            out.push(&JsValue::from_str(&class));
            out.push(&annotation.style.map_or(JsValue::UNDEFINED, |s| JsValue::from_str(&s)));
            out.into()
        }) as Box<dyn Fn(JsValue) -> JsValue>);

        let reco = global_function("__reader_recogito_init")?
            .call3(
                &JsValue::NULL,
                &JsValue::from_str(content_id),
                &vocabulary,
                format.as_ref().unchecked_ref(),
            )
            .map_err(script_error)?;

        // Recogito keeps the formatter for the life of the page.
        format.forget();
        self.reco = Some(reco);
        Ok(())
    }

    fn annotations(&self) -> Result<AnnotationSet, EngineError> {
        let (reco, get) = self.method("getAnnotations")?;
        let list = get.call0(&reco).map_err(script_error)?;
        let json: String = js_sys::JSON::stringify(&list).map_err(script_error)?.into();
        Ok(AnnotationSet::decode(&json)?)
    }

    async fn set_annotations(&mut self, set: &AnnotationSet) -> Result<(), EngineError> {
        let (reco, set_all) = self.method("setAnnotations")?;
        let list = js_sys::JSON::parse(&set.encode()?).map_err(script_error)?;
        let painting = set_all.call1(&reco, &list).map_err(script_error)?;
        // Recogito paints in animation-frame batches; its promise settles
        // after the last one.
        JsFuture::from(js_sys::Promise::resolve(&painting))
            .await
            .map_err(script_error)?;
        Ok(())
    }

    fn on_mutate(&mut self, listener: MutationListener) {
        let (reco, on) = match self.method("on") {
            Ok(found) => found,
            Err(e) => {
                log::error!("Cannot subscribe to annotation changes: {e}");
                return;
            }
        };

        for (event, kind) in [
            ("createAnnotation", MutationKind::Created),
            ("updateAnnotation", MutationKind::Updated),
            ("deleteAnnotation", MutationKind::Deleted),
        ] {
            let listener = Rc::clone(&listener);
            let callback = Closure::wrap(Box::new(move |_annotation: JsValue| {
                listener(kind);
            }) as Box<dyn Fn(JsValue)>);
            if let Err(e) = on.call2(&reco, &JsValue::from_str(event), callback.as_ref().unchecked_ref()) {
                log::error!("Subscribing to {event} failed: {:?}", e);
            }
            callback.forget();
        }
    }

    fn apply(&mut self, command: EngineCommand) -> Result<(), EngineError> {
        match command {
            EngineCommand::SetReadOnly(read_only) => self.set_flag("readOnly", read_only),
            EngineCommand::SetEditorDisabled(disabled) => self.set_flag("disableEditor", disabled),
            EngineCommand::DismissEmptyEditor => {
                global_function("__reader_dismiss_empty_editor")?
                    .call1(&JsValue::NULL, self.instance()?)
                    .map_err(script_error)?;
                Ok(())
            }
        }
    }
}
