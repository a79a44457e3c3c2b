use crate::config::NoteSurface;
use crate::dom::{Page, Scope, SelectorChain};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MergeOutcome {
    Prepended,
    Reloaded,
}

/// The only writer of the notes list.
#[derive(Clone, Debug)]
pub(crate) struct ListSynchronizer {
    list: SelectorChain,
    empty: SelectorChain,
}

impl ListSynchronizer {
    pub fn new(surface: &NoteSurface) -> Self {
        Self {
            list: surface.list.clone(),
            empty: surface.empty.clone(),
        }
    }

    /// Inserts `fragment_html` as the newest (first) item of the list in `scope`.
    ///
    /// The empty-state placeholder goes first. With no list anywhere on the
    /// page the update cannot be shown, so the page reloads instead.
    pub fn merge<P: Page>(&self, page: &P, scope: &Scope<P::Node>, fragment_html: &str) -> MergeOutcome {
        let Some(list) = self.list.find_or_document(page, scope) else {
            leptos::logging::warn!("notes: no list container found; reloading");
            return self.reload(page);
        };

        let placeholder = self
            .empty
            .find(page, &Scope::Element(list.clone()))
            .or_else(|| scope.element().and_then(|_| self.empty.find(page, scope)));
        if let Some(placeholder) = placeholder {
            page.remove(&placeholder);
        }

        page.prepend_html(&list, fragment_html);
        MergeOutcome::Prepended
    }

    pub fn reload<P: Page>(&self, page: &P) -> MergeOutcome {
        page.reload();
        MergeOutcome::Reloaded
    }
}
