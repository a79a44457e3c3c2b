use crate::dom::Page;

/// Marker set on a trigger once its click handler is attached.
pub(crate) const NOTES_BOUND_ATTR: &str = "data-notes-bound";
/// Marker set on a scroll region once its observer is attached.
pub(crate) const SCROLL_BOUND_ATTR: &str = "data-scroll-bound";

pub(crate) fn is_bound<P: Page>(page: &P, element: &P::Node, marker: &str) -> bool {
    page.attribute(element, marker).as_deref() == Some("1")
}

/// Attaches `handler` unless `element` already carries `marker`.
///
/// The flag lives on the element itself, so nodes that survive a content swap
/// keep it and nodes that arrive fresh get bound. Returns whether a listener
/// was attached.
pub(crate) fn bind_once<P: Page>(
    page: &P,
    element: &P::Node,
    marker: &str,
    event: &str,
    handler: Box<dyn FnMut()>,
) -> bool {
    if !claim(page, element, marker) {
        return false;
    }
    page.listen(element, event, true, handler);
    true
}

/// Sets `marker` if absent. Used where attaching is more than one listener.
pub(crate) fn claim<P: Page>(page: &P, element: &P::Node, marker: &str) -> bool {
    if is_bound(page, element, marker) {
        return false;
    }
    page.set_attribute(element, marker, "1");
    true
}
