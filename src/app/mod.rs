use crate::api::{HttpTransport, NoteTransport};
use crate::binding::{bind_once, NOTES_BOUND_ATTR};
use crate::config::NotesConfig;
use crate::dom::{BrowserPage, Page};
use crate::scroll::ScrollRegistry;
use crate::submit::{AnnotationSubmitter, SubmitGate};
use crate::target::root_scope;
use leptos::logging::{log, warn};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Document events that re-run initialization after dynamic content changes.
pub(crate) const CONTENT_INSERTED_EVENT: &str = "notes:content-inserted";
pub(crate) const CONTENT_SWAPPED_EVENT: &str = "notes:content-swapped";

pub(crate) type Spawner = Rc<dyn Fn(Pin<Box<dyn Future<Output = ()>>>)>;

/// Everything one notes integration needs, passed explicitly instead of read
/// from shared page globals. Several contexts can live on the same page.
pub(crate) struct NotesContext<P: Page, T: NoteTransport> {
    page: Rc<P>,
    config: Rc<NotesConfig>,
    submitter: Rc<AnnotationSubmitter<P, T>>,
    spawn: Spawner,
}

impl<P: Page + 'static, T: NoteTransport + 'static> NotesContext<P, T> {
    pub fn new(page: Rc<P>, transport: Rc<T>, config: Rc<NotesConfig>, spawn: Spawner) -> Self {
        let submitter = Rc::new(AnnotationSubmitter::new(
            page.clone(),
            transport,
            config.clone(),
        ));
        Self {
            page,
            config,
            submitter,
            spawn,
        }
    }

    pub fn config(&self) -> &NotesConfig {
        &self.config
    }

    /// Binds every trigger that has an input and is not bound yet.
    ///
    /// Safe to call any number of times; returns how many triggers were newly bound.
    pub fn init_pass(&self) -> usize {
        let page = self.page.as_ref();
        let surface = self.submitter.surface();
        let mut bound = 0;

        for trigger in page.query_all(&self.config.trigger_selector) {
            let scope = root_scope(page, surface, &trigger);
            if surface.input.find_or_document(page, &scope).is_none() {
                continue;
            }

            let gate = Rc::new(SubmitGate::default());
            let submitter = self.submitter.clone();
            let spawn = self.spawn.clone();
            let target = trigger.clone();
            let attached = bind_once(
                page,
                &trigger,
                NOTES_BOUND_ATTR,
                "click",
                Box::new(move || {
                    let submitter = submitter.clone();
                    let gate = gate.clone();
                    let target = target.clone();
                    spawn(Box::pin(async move {
                        let _ = submitter.submit(&gate, &target).await;
                    }));
                }),
            );
            if attached {
                bound += 1;
            }
        }

        if bound > 0 {
            log!("notes: bound {bound} trigger(s)");
        }
        bound
    }
}

/// Wires the notes layer into the live page.
pub fn start() {
    let Some(page) = BrowserPage::new() else {
        warn!("notes: no window/document; nothing to do");
        return;
    };
    let page = Rc::new(page);
    let config = Rc::new(NotesConfig::load());
    let spawn: Spawner = Rc::new(|fut: Pin<Box<dyn Future<Output = ()>>>| {
        leptos::task::spawn_local(fut)
    });
    let ctx = Rc::new(NotesContext::new(
        page.clone(),
        Rc::new(HttpTransport::new()),
        config,
        spawn,
    ));

    let scroll = ScrollRegistry::install(page.window());

    let run = {
        let ctx = ctx.clone();
        let page = page.clone();
        Rc::new(move || {
            ctx.init_pass();
            scroll.attach_all(&page, ctx.config());
        })
    };

    let document = page.document();
    for event in [CONTENT_INSERTED_EVENT, CONTENT_SWAPPED_EVENT] {
        let run = run.clone();
        let cb = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| run());
        let _ = document.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref());
        cb.forget();
    }

    let loading = js_sys::Reflect::get(document, &"readyState".into())
        .ok()
        .and_then(|v| v.as_string())
        .is_some_and(|s| s == "loading");
    if loading {
        let run = run.clone();
        let cb = Closure::once_into_js(move || run());
        let opts = web_sys::AddEventListenerOptions::new();
        opts.set_once(true);
        let _ = document.add_event_listener_with_callback_and_add_event_listener_options(
            "DOMContentLoaded",
            cb.as_ref().unchecked_ref(),
            &opts,
        );
    } else {
        run();
    }
}
