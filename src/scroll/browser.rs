use super::{FrameScheduler, MutationKind, RegionSet, ScrollGeometry, ScrollRegion, ScrollSurface};
use crate::binding::{claim, SCROLL_BOUND_ATTR};
use crate::config::NotesConfig;
use crate::dom::{BrowserPage, Page};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Element, MutationObserver, MutationObserverInit, MutationRecord, Window};

/// Window event that forces every region to its bottom.
pub(crate) const NOTES_APPENDED_EVENT: &str = "notes:appended";

struct ElementSurface(Element);

impl ScrollSurface for ElementSurface {
    fn geometry(&self) -> ScrollGeometry {
        ScrollGeometry {
            scroll_height: self.0.scroll_height() as f64,
            client_height: self.0.client_height() as f64,
            scroll_top: self.0.scroll_top() as f64,
        }
    }

    fn set_scroll_top(&self, top: f64) {
        // scrollTop is `long` or `double` depending on the binding; set it untyped.
        let _ = js_sys::Reflect::set(&self.0, &"scrollTop".into(), &top.into());
    }
}

/// Two animation frames: the first lands before layout of the mutation, the
/// second after it.
struct DoubleFrame(Window);

impl FrameScheduler for DoubleFrame {
    fn after_paint(&self, f: Box<dyn FnOnce()>) {
        let win = self.0.clone();
        let outer = Closure::once_into_js(move || {
            let inner = Closure::once_into_js(move || f());
            let _ = win.request_animation_frame(inner.as_ref().unchecked_ref());
        });
        let _ = self.0.request_animation_frame(outer.as_ref().unchecked_ref());
    }
}

type BrowserRegion = ScrollRegion<ElementSurface, DoubleFrame>;

#[derive(Clone)]
struct AttachedRegion {
    element: Element,
    region: Rc<BrowserRegion>,
    observer: Option<MutationObserver>,
}

/// Every auto-scroll region on the page, behind one `notes:appended` listener.
pub(crate) struct ScrollRegistry {
    window: Window,
    regions: Rc<RegionSet<AttachedRegion>>,
}

impl ScrollRegistry {
    pub fn install(window: &Window) -> Self {
        let regions: Rc<RegionSet<AttachedRegion>> = Rc::new(RegionSet::default());

        let live = regions.clone();
        let on_appended = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
            prune(&live);
            for attached in live.snapshot() {
                attached.region.force_snap();
            }
        });
        let _ = window.add_event_listener_with_callback(NOTES_APPENDED_EVENT, on_appended.as_ref().unchecked_ref());
        on_appended.forget();

        Self {
            window: window.clone(),
            regions,
        }
    }

    /// Drops regions that left the document, then attaches every new one.
    pub fn attach_all(&self, page: &BrowserPage, config: &NotesConfig) -> usize {
        prune(&self.regions);
        let mut attached = 0;
        for el in page.query_all(&config.scroll_region_selector) {
            if !claim(page, &el, SCROLL_BOUND_ATTR) {
                continue;
            }
            self.regions
                .insert(attach_one(&self.window, el, config.near_bottom_threshold));
            attached += 1;
        }
        attached
    }
}

fn prune(regions: &RegionSet<AttachedRegion>) {
    for gone in regions.prune(|r| r.element.is_connected()) {
        if let Some(observer) = gone.observer {
            observer.disconnect();
        }
    }
}

fn mutation_kinds(records: &js_sys::Array) -> Vec<MutationKind> {
    records
        .iter()
        .filter_map(|v| v.dyn_into::<MutationRecord>().ok())
        .map(|m| {
            if m.type_() == "childList" {
                MutationKind::ChildList {
                    added: m.added_nodes().length(),
                }
            } else {
                MutationKind::Other
            }
        })
        .collect()
}

fn attach_one(window: &Window, el: Element, threshold: f64) -> AttachedRegion {
    let region = Rc::new(ScrollRegion::new(
        Rc::new(ElementSurface(el.clone())),
        DoubleFrame(window.clone()),
        threshold,
    ));
    region.attach();

    let r = region.clone();
    let on_scroll = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
        r.on_scroll();
    });
    let opts = AddEventListenerOptions::new();
    opts.set_passive(true);
    let _ = el.add_event_listener_with_callback_and_add_event_listener_options(
        "scroll",
        on_scroll.as_ref().unchecked_ref(),
        &opts,
    );
    on_scroll.forget();

    let r = region.clone();
    let on_mutate = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
        move |records: js_sys::Array, _obs: MutationObserver| {
            r.on_mutations(&mutation_kinds(&records));
        },
    );
    let observer = match MutationObserver::new(on_mutate.as_ref().unchecked_ref()) {
        Ok(observer) => {
            let init = MutationObserverInit::new();
            init.set_child_list(true);
            init.set_subtree(false);
            let _ = observer.observe_with_options(&el, &init);
            Some(observer)
        }
        Err(_) => {
            leptos::logging::warn!("notes: MutationObserver unavailable; auto-scroll limited to attach");
            None
        }
    };
    on_mutate.forget();

    AttachedRegion {
        element: el,
        region,
        observer,
    }
}
