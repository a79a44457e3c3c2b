mod browser;
#[cfg(test)]
pub(crate) mod fake;

pub(crate) use browser::BrowserPage;

/// Where a lookup runs: inside one element, or across the whole document.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Scope<N> {
    Document,
    Element(N),
}

impl<N> Scope<N> {
    pub fn element(&self) -> Option<&N> {
        match self {
            Scope::Element(n) => Some(n),
            Scope::Document => None,
        }
    }
}

/// Everything the notes layer needs from the live document.
///
/// Components never hold `web_sys` types directly; they go through this trait so
/// the same resolution/merge logic runs against the browser and against the
/// in-memory page used by unit tests.
pub(crate) trait Page {
    type Node: Clone + PartialEq + std::fmt::Debug;

    fn query(&self, scope: &Scope<Self::Node>, selector: &str) -> Option<Self::Node>;
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn matches(&self, node: &Self::Node, selector: &str) -> bool;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    /// Current value of a form control (`input`, `textarea`).
    fn value(&self, node: &Self::Node) -> String;
    fn set_value(&self, node: &Self::Node, value: &str);

    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);
    fn focus(&self, node: &Self::Node);

    fn remove(&self, node: &Self::Node);
    /// Parses `html` and inserts it as the first child of `node`.
    fn prepend_html(&self, node: &Self::Node, html: &str);
    fn create_element(&self, tag: &str) -> Option<Self::Node>;
    fn set_text(&self, node: &Self::Node, text: &str);
    fn insert_first(&self, parent: &Self::Node, child: &Self::Node);
    fn body(&self) -> Option<Self::Node>;

    fn location_path(&self) -> String;
    fn reload(&self);

    /// Attaches `handler` for `event` on `node` for the lifetime of the node.
    fn listen(&self, node: &Self::Node, event: &str, prevent_default: bool, handler: Box<dyn FnMut()>);

    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node> {
        let mut cur = Some(node.clone());
        while let Some(n) = cur {
            if self.matches(&n, selector) {
                return Some(n);
            }
            cur = self.parent(&n);
        }
        None
    }
}

/// Ordered CSS selectors; the first one that yields an element wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SelectorChain(pub Vec<String>);

impl SelectorChain {
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(selectors.into_iter().map(Into::into).collect())
    }

    pub fn find<P: Page>(&self, page: &P, scope: &Scope<P::Node>) -> Option<P::Node> {
        self.0
            .iter()
            .filter(|s| !s.trim().is_empty())
            .find_map(|s| page.query(scope, s))
    }

    /// Scoped lookup first, then the same chain across the whole document.
    pub fn find_or_document<P: Page>(&self, page: &P, scope: &Scope<P::Node>) -> Option<P::Node> {
        self.find(page, scope).or_else(|| match scope {
            Scope::Element(_) => self.find(page, &Scope::Document),
            Scope::Document => None,
        })
    }
}
