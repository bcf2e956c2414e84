//! Component registry for embedded MDX components.
//!
//! Maps a tag name (`Callout`, `Sketch`, ...) to the renderer that replaces
//! it. The registry is assembled once when the process starts and is only
//! read afterwards, so it can be shared across compile threads behind an
//! `Arc`.

use std::{collections::BTreeMap, fmt, sync::Arc};

use folio_core::config::ComponentConfig;
use serde_json::Value;

use crate::html_escape;

/// Component props, by attribute name.
pub type Props = BTreeMap<String, Value>;

/// A renderable component.
pub trait Component: Send + Sync + fmt::Debug {
    /// Check props at compile time. Return a reason when they are unusable.
    fn validate(&self, _props: &Props) -> Result<(), String> {
        Ok(())
    }

    /// Render the component around its already rendered children.
    fn render(&self, props: &Props, children: &str) -> String;
}

/// Read a prop as text. Strings are returned as-is, other values as JSON.
pub fn prop_str(props: &Props, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn require(props: &Props, key: &str) -> Result<(), String> {
    match prop_str(props, key) {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(format!("missing required prop `{key}`")),
    }
}

fn attr(name: &str, value: Option<String>) -> String {
    value
        .map(|v| format!(r#" {name}="{}""#, html_escape(&v)))
        .unwrap_or_default()
}

/// Highlighted aside: `<Callout type="warning" title="Heads up">...</Callout>`.
#[derive(Debug, Default)]
pub struct Callout;

impl Component for Callout {
    fn render(&self, props: &Props, children: &str) -> String {
        let kind = prop_str(props, "type").unwrap_or_else(|| "note".to_string());
        let title = prop_str(props, "title")
            .map(|t| format!(r#"<p class="callout-title">{}</p>"#, html_escape(&t)))
            .unwrap_or_default();

        format!(
            r#"<aside class="callout callout-{}" role="note">{title}<div class="callout-body">{children}</div></aside>"#,
            html_escape(&kind)
        )
    }
}

/// Image with optional caption: `<Figure src="/img/a.png" alt="..." caption="..." />`.
#[derive(Debug, Default)]
pub struct Figure;

impl Component for Figure {
    fn validate(&self, props: &Props) -> Result<(), String> {
        require(props, "src")
    }

    fn render(&self, props: &Props, children: &str) -> String {
        let caption = prop_str(props, "caption")
            .map(|c| html_escape(&c))
            .unwrap_or_else(|| children.trim().to_string());
        let caption = if caption.is_empty() {
            String::new()
        } else {
            format!("<figcaption>{caption}</figcaption>")
        };

        format!(
            r#"<figure class="figure"><img{}{}{}{} loading="lazy" />{caption}</figure>"#,
            attr("src", prop_str(props, "src")),
            attr("alt", Some(prop_str(props, "alt").unwrap_or_default())),
            attr("width", prop_str(props, "width")),
            attr("height", prop_str(props, "height")),
        )
    }
}

/// Mount point for an interactive sketch: `<Sketch src="/sketches/flow.js" height={480} />`.
///
/// The script is loaded as a module and finds its container through
/// `data-sketch`.
#[derive(Debug, Default)]
pub struct Sketch;

impl Component for Sketch {
    fn validate(&self, props: &Props) -> Result<(), String> {
        require(props, "src")?;
        if let Some(height) = props.get("height")
            && !height.is_u64()
        {
            return Err("`height` must be a positive integer".to_string());
        }
        Ok(())
    }

    fn render(&self, props: &Props, children: &str) -> String {
        let src = prop_str(props, "src").unwrap_or_default();
        let height = props.get("height").and_then(Value::as_u64).unwrap_or(400);
        let caption = if children.trim().is_empty() {
            String::new()
        } else {
            format!("<figcaption>{}</figcaption>", children.trim())
        };

        format!(
            r#"<figure class="sketch"><div class="sketch-canvas" data-sketch="{src}" style="min-height: {height}px"><noscript>This sketch needs JavaScript.</noscript></div>{caption}<script type="module" src="{src}"></script></figure>"#,
            src = html_escape(&src)
        )
    }
}

/// Embedded video: `<YouTube id="dQw4w9WgXcQ" />`.
#[derive(Debug, Default)]
pub struct YouTube;

impl Component for YouTube {
    fn validate(&self, props: &Props) -> Result<(), String> {
        require(props, "id")
    }

    fn render(&self, props: &Props, _children: &str) -> String {
        let id = prop_str(props, "id").unwrap_or_default();
        let title = prop_str(props, "title").unwrap_or_else(|| "YouTube video".to_string());
        format!(
            r#"<div class="video"><iframe src="https://www.youtube-nocookie.com/embed/{}" title="{}" loading="lazy" allowfullscreen></iframe></div>"#,
            html_escape(&id),
            html_escape(&title)
        )
    }
}

/// Component declared in configuration: wraps children in a plain element.
///
/// Props become `data-*` attributes.
#[derive(Debug, Clone)]
pub struct ElementComponent {
    element: String,
    class: Option<String>,
}

impl ElementComponent {
    #[must_use]
    pub fn new(element: impl Into<String>, class: Option<String>) -> Self {
        Self {
            element: element.into(),
            class,
        }
    }
}

impl From<&ComponentConfig> for ElementComponent {
    fn from(config: &ComponentConfig) -> Self {
        Self::new(config.element.clone(), config.class.clone())
    }
}

impl Component for ElementComponent {
    fn render(&self, props: &Props, children: &str) -> String {
        let mut attrs = attr("class", self.class.clone());
        for key in props.keys() {
            let name = format!("data-{}", key.to_lowercase());
            attrs.push_str(&attr(&name, prop_str(props, key)));
        }
        format!("<{el}{attrs}>{children}</{el}>", el = self.element)
    }
}

/// Registry of components by tag name.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: BTreeMap<String, Arc<dyn Component>>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in components.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register("Callout", Callout)
            .register("Figure", Figure)
            .register("Sketch", Sketch)
            .register("YouTube", YouTube);
        registry
    }

    /// Built-ins plus the components declared in configuration.
    ///
    /// A configured component replaces a built-in of the same name.
    #[must_use]
    pub fn from_config(components: &BTreeMap<String, ComponentConfig>) -> Self {
        let mut registry = Self::with_builtins();
        for (name, config) in components {
            registry.register(name.clone(), ElementComponent::from(config));
        }
        registry
    }

    /// Register a component under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        component: impl Component + 'static,
    ) -> &mut Self {
        self.components.insert(name.into(), Arc::new(component));
        self
    }

    /// Look up a component by tag name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Component> {
        self.components.get(name).map(AsRef::as_ref)
    }

    /// Check whether a tag name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Registered tag names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }
}
