//! In-memory page for unit tests.
//!
//! Supports the compound selectors the notes layer uses (`tag`, `#id`,
//! `.class`, `[attr]`, `[attr="value"]`, comma lists). No combinators.

use super::{Page, Scope};
use std::cell::{Cell, RefCell};

type Listener = (usize, String, Box<dyn FnMut()>);

#[derive(Debug, Default)]
struct FakeNode {
    tag: String,
    attrs: Vec<(String, String)>,
    value: Option<String>,
    text: String,
    html: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
}

pub(crate) struct FakePage {
    nodes: RefCell<Vec<FakeNode>>,
    listeners: RefCell<Vec<Listener>>,
    path: RefCell<String>,
    reloads: Cell<usize>,
    focused: Cell<Option<usize>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(vec![FakeNode {
                tag: "body".to_string(),
                ..Default::default()
            }]),
            listeners: RefCell::new(Vec::new()),
            path: RefCell::new("/".to_string()),
            reloads: Cell::new(0),
            focused: Cell::new(None),
        }
    }

    /// Appends a new element under `parent` (the body when `None`).
    pub fn add(&self, parent: Option<usize>, tag: &str, attrs: &[(&str, &str)]) -> usize {
        let parent = parent.unwrap_or(0);
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        nodes.push(FakeNode {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            parent: Some(parent),
            ..Default::default()
        });
        nodes[parent].children.push(id);
        id
    }

    pub fn set_path(&self, path: &str) {
        *self.path.borrow_mut() = path.to_string();
    }

    pub fn children(&self, node: usize) -> Vec<usize> {
        self.nodes.borrow()[node].children.clone()
    }

    pub fn html(&self, node: usize) -> Option<String> {
        self.nodes.borrow()[node].html.clone()
    }

    pub fn text(&self, node: usize) -> String {
        self.nodes.borrow()[node].text.clone()
    }

    pub fn has_class(&self, node: usize, class: &str) -> bool {
        self.class_list(node).iter().any(|c| c == class)
    }

    pub fn is_attached(&self, node: usize) -> bool {
        let nodes = self.nodes.borrow();
        let mut cur = node;
        loop {
            if cur == 0 {
                return true;
            }
            match nodes[cur].parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.get()
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused.get()
    }

    pub fn listener_count(&self, node: usize, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|(n, e, _)| *n == node && e == event)
            .count()
    }

    /// Runs every handler registered for `event` on `node`.
    pub fn dispatch(&self, node: usize, event: &str) {
        let mut taken = std::mem::take(&mut *self.listeners.borrow_mut());
        for (n, e, handler) in taken.iter_mut() {
            if *n == node && e == event {
                handler();
            }
        }
        let mut listeners = self.listeners.borrow_mut();
        taken.append(&mut listeners);
        *listeners = taken;
    }

    fn class_list(&self, node: usize) -> Vec<String> {
        self.attribute(&node, "class")
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    fn descendants(&self, root: usize) -> Vec<usize> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<usize> = nodes[root].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(nodes[n].children.iter().rev().copied());
        }
        out
    }

    fn matches_compound(&self, node: usize, compound: &Compound) -> bool {
        let nodes = self.nodes.borrow();
        let n = &nodes[node];
        if let Some(tag) = &compound.tag {
            if !n.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        let attr = |name: &str| {
            n.attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        if let Some(id) = &compound.id {
            if attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        let classes: Vec<&str> = attr("class").unwrap_or_default().split_whitespace().collect();
        if !compound.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
        compound.attrs.iter().all(|(name, want)| match (attr(name), want) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(v), Some(w)) => v == w,
        })
    }
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

fn parse_compound(sel: &str) -> Compound {
    let mut out = Compound::default();
    let chars: Vec<char> = sel.trim().chars().collect();
    let ident_end = |from: usize| {
        let mut i = from;
        while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '-' || chars[i] == '_') {
            i += 1;
        }
        i
    };

    let mut i = ident_end(0);
    if i > 0 {
        out.tag = Some(chars[..i].iter().collect());
    }
    while i < chars.len() {
        match chars[i] {
            '#' => {
                let end = ident_end(i + 1);
                out.id = Some(chars[i + 1..end].iter().collect());
                i = end;
            }
            '.' => {
                let end = ident_end(i + 1);
                out.classes.push(chars[i + 1..end].iter().collect());
                i = end;
            }
            '[' => {
                let close = chars[i..].iter().position(|c| *c == ']').map(|p| p + i).unwrap_or(chars.len());
                let body: String = chars[i + 1..close].iter().collect();
                match body.split_once('=') {
                    Some((k, v)) => out.attrs.push((
                        k.trim().to_string(),
                        Some(v.trim().trim_matches('"').trim_matches('\'').to_string()),
                    )),
                    None => out.attrs.push((body.trim().to_string(), None)),
                }
                i = close + 1;
            }
            _ => i += 1,
        }
    }
    out
}

impl Page for FakePage {
    type Node = usize;

    fn query(&self, scope: &Scope<usize>, selector: &str) -> Option<usize> {
        let root = match scope {
            Scope::Document => 0,
            Scope::Element(n) => *n,
        };
        let mut candidates = self.descendants(root);
        if matches!(scope, Scope::Document) {
            candidates.insert(0, 0);
        }
        candidates.into_iter().find(|n| self.matches(n, selector))
    }

    fn query_all(&self, selector: &str) -> Vec<usize> {
        let mut all = vec![0];
        all.extend(self.descendants(0));
        all.into_iter().filter(|n| self.matches(n, selector)).collect()
    }

    fn parent(&self, node: &usize) -> Option<usize> {
        self.nodes.borrow()[*node].parent
    }

    fn matches(&self, node: &usize, selector: &str) -> bool {
        selector
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .any(|s| self.matches_compound(*node, &parse_compound(s)))
    }

    fn attribute(&self, node: &usize, name: &str) -> Option<String> {
        self.nodes.borrow()[*node]
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(&self, node: &usize, name: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let attrs = &mut nodes[*node].attrs;
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn value(&self, node: &usize) -> String {
        let explicit = self.nodes.borrow()[*node].value.clone();
        explicit
            .or_else(|| self.attribute(node, "value"))
            .unwrap_or_default()
    }

    fn set_value(&self, node: &usize, value: &str) {
        self.nodes.borrow_mut()[*node].value = Some(value.to_string());
    }

    fn add_class(&self, node: &usize, class: &str) {
        let mut classes = self.class_list(*node);
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
        self.set_attribute(node, "class", &classes.join(" "));
    }

    fn remove_class(&self, node: &usize, class: &str) {
        let classes: Vec<String> = self
            .class_list(*node)
            .into_iter()
            .filter(|c| c != class)
            .collect();
        self.set_attribute(node, "class", &classes.join(" "));
    }

    fn focus(&self, node: &usize) {
        self.focused.set(Some(*node));
    }

    fn remove(&self, node: &usize) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(p) = nodes[*node].parent.take() {
            nodes[p].children.retain(|c| c != node);
        }
    }

    fn prepend_html(&self, node: &usize, html: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        nodes.push(FakeNode {
            tag: "#fragment".to_string(),
            html: Some(html.to_string()),
            parent: Some(*node),
            ..Default::default()
        });
        nodes[*node].children.insert(0, id);
    }

    fn create_element(&self, tag: &str) -> Option<usize> {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(FakeNode {
            tag: tag.to_string(),
            ..Default::default()
        });
        Some(nodes.len() - 1)
    }

    fn set_text(&self, node: &usize, text: &str) {
        self.nodes.borrow_mut()[*node].text = text.to_string();
    }

    fn insert_first(&self, parent: &usize, child: &usize) {
        self.remove(child);
        let mut nodes = self.nodes.borrow_mut();
        nodes[*child].parent = Some(*parent);
        nodes[*parent].children.insert(0, *child);
    }

    fn body(&self) -> Option<usize> {
        Some(0)
    }

    fn location_path(&self) -> String {
        self.path.borrow().clone()
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }

    fn listen(&self, node: &usize, event: &str, _prevent_default: bool, handler: Box<dyn FnMut()>) {
        self.listeners
            .borrow_mut()
            .push((*node, event.to_string(), handler));
    }
}
