use crate::config::NotesConfig;
use crate::dom::{Page, Scope};

/// Reads the anti-forgery token from the page. Never writes.
#[derive(Clone, Debug)]
pub(crate) struct TokenProvider {
    field_selector: String,
    meta_selector: String,
}

impl TokenProvider {
    pub fn new(config: &NotesConfig) -> Self {
        Self {
            field_selector: config.token_field_selector.clone(),
            meta_selector: config.token_meta_selector.clone(),
        }
    }

    /// Hidden field in `scope`, then the same field document-wide, then the meta tag.
    ///
    /// `None` means "send no header"; the server decides whether that is fatal.
    pub fn resolve<P: Page>(&self, page: &P, scope: &Scope<P::Node>) -> Option<String> {
        let field = |s: &Scope<P::Node>| {
            page.query(s, &self.field_selector)
                .map(|n| page.value(&n))
                .filter(|v| !v.trim().is_empty())
        };

        field(scope)
            .or_else(|| match scope {
                Scope::Element(_) => field(&Scope::Document),
                Scope::Document => None,
            })
            .or_else(|| {
                page.query(&Scope::Document, &self.meta_selector)
                    .and_then(|m| page.attribute(&m, "content"))
                    .filter(|v| !v.trim().is_empty())
            })
    }
}
