use super::{Page, Scope};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement, Window};

/// `Page` over the live browser document.
#[derive(Clone)]
pub(crate) struct BrowserPage {
    window: Window,
    document: Document,
}

impl BrowserPage {
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl Page for BrowserPage {
    type Node = Element;

    fn query(&self, scope: &Scope<Element>, selector: &str) -> Option<Element> {
        match scope {
            Scope::Document => self.document.query_selector(selector).ok().flatten(),
            Scope::Element(el) => el.query_selector(selector).ok().flatten(),
        }
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|n| n.dyn_into::<Element>().ok())
            .collect()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn matches(&self, node: &Element, selector: &str) -> bool {
        node.matches(selector).unwrap_or(false)
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn value(&self, node: &Element) -> String {
        if let Some(ta) = node.dyn_ref::<HtmlTextAreaElement>() {
            return ta.value();
        }
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            return input.value();
        }
        node.get_attribute("value").unwrap_or_default()
    }

    fn set_value(&self, node: &Element, value: &str) {
        if let Some(ta) = node.dyn_ref::<HtmlTextAreaElement>() {
            ta.set_value(value);
        } else if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        }
    }

    fn add_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().add_1(class);
    }

    fn remove_class(&self, node: &Element, class: &str) {
        let _ = node.class_list().remove_1(class);
    }

    fn focus(&self, node: &Element) {
        if let Some(el) = node.dyn_ref::<HtmlElement>() {
            let _ = el.focus();
        }
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn prepend_html(&self, node: &Element, html: &str) {
        let _ = node.insert_adjacent_html("afterbegin", html);
    }

    fn create_element(&self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn insert_first(&self, parent: &Element, child: &Element) {
        let first = parent.first_child();
        let _ = parent.insert_before(child, first.as_ref());
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Into::into)
    }

    fn location_path(&self) -> String {
        self.window.location().pathname().unwrap_or_default()
    }

    fn reload(&self) {
        let _ = self.window.location().reload();
    }

    fn listen(&self, node: &Element, event: &str, prevent_default: bool, mut handler: Box<dyn FnMut()>) {
        let cb = Closure::<dyn FnMut(web_sys::Event)>::new(move |ev: web_sys::Event| {
            if prevent_default {
                ev.prevent_default();
            }
            handler();
        });
        let _ = node.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref());
        // Lives as long as the element; swapped-out nodes take it with them.
        cb.forget();
    }
}
