use crate::dom::{Page, SelectorChain};
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_NEAR_BOTTOM_THRESHOLD: f64 = 120.0;

/// Page-level settings for the notes layer.
///
/// Every field has a default, so a page only ships the keys it needs to change.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub(crate) struct NotesConfig {
    pub trigger_selector: String,
    pub input_selectors: Vec<String>,
    pub list_selectors: Vec<String>,
    pub empty_selectors: Vec<String>,

    /// Ancestor attributes that carry the record id, in priority order.
    pub record_attributes: Vec<String>,
    /// Path segments followed by the record id (`/records/{id}`).
    pub record_path_segments: Vec<String>,

    /// `{id}` is replaced with the percent-encoded record id.
    pub endpoint_template: String,
    pub payload_key: String,

    pub token_field_selector: String,
    pub token_meta_selector: String,

    pub invalid_class: String,
    pub permission_denied_message: String,
    pub generic_failure_message: String,

    pub scroll_region_selector: String,
    pub near_bottom_threshold: f64,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            trigger_selector: "[data-notes-submit], #add-note-btn, #add_note_btn".to_string(),
            input_selectors: vec![
                r#"textarea[name="new_note"]"#.to_string(),
                r#"textarea[name="text"]"#.to_string(),
                "#new_note".to_string(),
                "textarea".to_string(),
            ],
            list_selectors: vec![
                "#notes-list".to_string(),
                "[data-notes-list]".to_string(),
                ".notes-list".to_string(),
            ],
            empty_selectors: vec!["[data-notes-empty]".to_string(), ".empty-state".to_string()],
            record_attributes: vec!["data-record-id".to_string(), "data-case-id".to_string()],
            record_path_segments: vec!["records".to_string(), "cases".to_string()],
            endpoint_template: "/records/{id}/notes".to_string(),
            payload_key: "new_note".to_string(),
            token_field_selector: r#"input[name="csrf_token"]"#.to_string(),
            token_meta_selector: r#"meta[name="csrf-token"]"#.to_string(),
            invalid_class: "is-invalid".to_string(),
            permission_denied_message: "You do not have permission to add notes to this record."
                .to_string(),
            generic_failure_message: "Something went wrong while saving the note.".to_string(),
            scroll_region_selector: r#"[data-scroll-bottom="true"]"#.to_string(),
            near_bottom_threshold: DEFAULT_NEAR_BOTTOM_THRESHOLD,
        }
    }
}

impl NotesConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads overrides from `window.ENV.NOTES` (or `window.ENV.notes`).
    ///
    /// Same channel the web app uses for `API_URL`; anything missing or
    /// malformed leaves the defaults in place.
    pub fn load() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let Some(env) = window.get("ENV") else {
            return Self::default();
        };
        if env.is_undefined() || !env.is_object() {
            return Self::default();
        }

        for key in ["NOTES", "notes"] {
            let Ok(raw) = js_sys::Reflect::get(&env, &key.into()) else {
                continue;
            };
            if raw.is_undefined() || raw.is_null() {
                continue;
            }
            let Some(json) = js_sys::JSON::stringify(&raw).ok().and_then(|s| s.as_string()) else {
                continue;
            };
            match Self::from_json(&json) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    leptos::logging::warn!("notes: ignoring malformed ENV.{key}: {e}");
                }
            }
        }

        Self::default()
    }

    pub fn surface(&self) -> NoteSurface {
        NoteSurface {
            input: SelectorChain::new(self.input_selectors.iter().cloned()),
            list: SelectorChain::new(self.list_selectors.iter().cloned()),
            empty: SelectorChain::new(self.empty_selectors.iter().cloned()),
            endpoint: EndpointBuilder::new(self.endpoint_template.clone()),
        }
    }
}

/// Where the endpoint for a submission comes from.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EndpointBuilder {
    template: String,
}

impl EndpointBuilder {
    pub const URL_ATTRIBUTE: &'static str = "data-notes-url";

    pub fn new(template: String) -> Self {
        Self { template }
    }

    pub fn for_record(&self, record_id: &str) -> String {
        self.template
            .replace("{id}", &urlencoding::encode(record_id))
    }

    /// An explicit `data-notes-url` on the trigger wins over the template.
    pub fn resolve<P: Page>(&self, page: &P, trigger: &P::Node, record_id: &str) -> String {
        page.attribute(trigger, Self::URL_ATTRIBUTE)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.for_record(record_id))
    }
}

/// How one notes widget finds its parts: which input, which list, which endpoint.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NoteSurface {
    pub input: SelectorChain,
    pub list: SelectorChain,
    pub empty: SelectorChain,
    pub endpoint: EndpointBuilder,
}
