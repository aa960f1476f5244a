//! Render requests and props serialization

use crate::error::{RendrError, RendrResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One render call
///
/// `route_id` must be stable per call site (for example the handler name),
/// not per request: it is how a changed file is traced back to the routes
/// that render it.
#[derive(Debug, Clone)]
pub struct RenderRequest<P = serde_json::Value> {
    /// Stable identifier of the calling route
    pub route_id: String,
    /// Component file, relative to the frontend root
    pub file: PathBuf,
    /// Document title
    pub title: String,
    /// Meta tags; keys starting with `og:` become `property` tags
    pub meta_tags: BTreeMap<String, String>,
    /// Props handed to the component, `null` when absent
    pub props: Option<P>,
    /// Request path for server-side routing
    pub location: Option<String>,
}

impl RenderRequest {
    /// Create a request without props
    pub fn new(route_id: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            route_id: route_id.into(),
            file: file.into(),
            title: String::new(),
            meta_tags: BTreeMap::new(),
            props: None,
            location: None,
        }
    }
}

impl<P> RenderRequest<P> {
    /// Set the document title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Add a meta tag
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta_tags.insert(key.into(), value.into());
        self
    }

    /// Set the request location
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Attach props of any serializable type
    pub fn props<Q>(self, props: Q) -> RenderRequest<Q> {
        RenderRequest {
            route_id: self.route_id,
            file: self.file,
            title: self.title,
            meta_tags: self.meta_tags,
            props: Some(props),
            location: self.location,
        }
    }
}

impl<P: Serialize> RenderRequest<P> {
    /// Props as a JavaScript expression safe to place inside `<script>`
    pub fn props_script(&self) -> RendrResult<String> {
        match &self.props {
            Some(props) => serde_json::to_string(props)
                .map(|json| escape_json_for_script(&json))
                .map_err(RendrError::Props),
            None => Ok("null".to_string()),
        }
    }
}

/// Escape characters that would let JSON break out of a script element
///
/// Only string contents can hold these characters in JSON text, and the
/// `\uXXXX` forms decode to the same values.
pub fn escape_json_for_script(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}
