use crate::config::{NoteSurface, NotesConfig};
use crate::dom::{Page, Scope};
use thiserror::Error;

/// The record a submission belongs to, and the subtree that scopes every
/// further lookup. Computed fresh per submission.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AnnotationTarget<N> {
    pub record_id: String,
    pub root_scope: Scope<N>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ResolutionFailure {
    #[error("no record id on any trigger ancestor and none in page path {path:?}")]
    NoRecordId { path: String },
}

/// One way of deriving a record id. Pure: reads the page, never mutates it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum RecordIdStrategy {
    /// Nearest ancestor (or the trigger itself) carrying one of these attributes.
    AncestorAttribute(Vec<String>),
    /// `/{segment}/{id}` anywhere in the current path.
    PagePath(Vec<String>),
}

impl RecordIdStrategy {
    pub fn resolve<P: Page>(&self, page: &P, trigger: &P::Node) -> Option<String> {
        match self {
            RecordIdStrategy::AncestorAttribute(attrs) => {
                let mut cur = Some(trigger.clone());
                while let Some(node) = cur {
                    let found = attrs.iter().find_map(|a| {
                        page.attribute(&node, a)
                            .map(|v| v.trim().to_string())
                            .filter(|v| !v.is_empty())
                    });
                    if found.is_some() {
                        return found;
                    }
                    cur = page.parent(&node);
                }
                None
            }
            RecordIdStrategy::PagePath(segments) => {
                record_id_from_path(&page.location_path(), segments)
            }
        }
    }
}

pub(crate) fn record_id_from_path(path: &str, segments: &[String]) -> Option<String> {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    segments.iter().find_map(|seg| {
        parts
            .windows(2)
            .find(|w| w[0] == seg.as_str() && is_record_id(w[1]))
            .map(|w| w[1].to_string())
    })
}

fn is_record_id(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Ordered record-id strategies, composed first-success-wins.
#[derive(Clone, Debug)]
pub(crate) struct TargetResolver {
    strategies: Vec<RecordIdStrategy>,
}

impl TargetResolver {
    pub fn new(strategies: Vec<RecordIdStrategy>) -> Self {
        Self { strategies }
    }

    pub fn from_config(config: &NotesConfig) -> Self {
        Self::new(vec![
            RecordIdStrategy::AncestorAttribute(config.record_attributes.clone()),
            RecordIdStrategy::PagePath(config.record_path_segments.clone()),
        ])
    }

    pub fn resolve<P: Page>(
        &self,
        page: &P,
        surface: &NoteSurface,
        trigger: &P::Node,
    ) -> Result<AnnotationTarget<P::Node>, ResolutionFailure> {
        let record_id = self
            .strategies
            .iter()
            .find_map(|s| s.resolve(page, trigger))
            .ok_or_else(|| ResolutionFailure::NoRecordId {
                path: page.location_path(),
            })?;

        Ok(AnnotationTarget {
            record_id,
            root_scope: root_scope(page, surface, trigger),
        })
    }
}

/// Nearest ancestor that holds both the input and the list; the whole
/// document when the trigger sits under no such element.
pub(crate) fn root_scope<P: Page>(page: &P, surface: &NoteSurface, trigger: &P::Node) -> Scope<P::Node> {
    let mut cur = page.parent(trigger);
    while let Some(node) = cur {
        let scope = Scope::Element(node.clone());
        if surface.input.find(page, &scope).is_some() && surface.list.find(page, &scope).is_some() {
            return scope;
        }
        cur = page.parent(&node);
    }
    Scope::Document
}
