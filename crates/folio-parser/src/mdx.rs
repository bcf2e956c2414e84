//! MDX body compiler built on pulldown-cmark.
//!
//! Markdown is rendered to HTML fragments. Tags whose name starts with an
//! uppercase letter are components: they are looked up in the
//! [`ComponentRegistry`] at compile time and kept as [`Node::Component`] so
//! the page renderer can substitute them later.
//!
//! Component tags are cut out of the body before markdown parsing and
//! replaced by `<folio-tag-N />` placeholders. A placeholder is always valid
//! inline HTML, so JSX props such as `data={["a", "b"]}` survive CommonMark's
//! attribute rules and every tag reaches the registry.

use std::{
    borrow::Cow,
    collections::{BTreeSet, HashMap},
};

use folio_core::TocEntry;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    html_escape,
    registry::{ComponentRegistry, Props},
    slugify,
    syntax::SyntaxHighlighter,
};

/// Body compilation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Tag name not present in the registry.
    #[error("unknown component <{name}>")]
    UnknownComponent { name: String },

    /// Closing tag with no open component.
    #[error("closing tag </{name}> has no matching opening tag")]
    UnexpectedClose { name: String },

    /// Closing tag for a different component than the innermost open one.
    #[error("expected </{expected}> but found </{found}>")]
    MismatchedClose { expected: String, found: String },

    /// Component still open at the end of the body.
    #[error("component <{name}> is never closed")]
    Unclosed { name: String },

    /// Tag syntax that cannot be read.
    #[error("malformed tag <{name}>: {reason}")]
    MalformedTag { name: String, reason: String },

    /// Props rejected by the parser or by the component.
    #[error("invalid props on <{name}>: {reason}")]
    InvalidProps { name: String, reason: String },
}

impl CompileError {
    /// Tag name the error is about.
    pub fn tag(&self) -> &str {
        match self {
            Self::UnknownComponent { name }
            | Self::UnexpectedClose { name }
            | Self::Unclosed { name }
            | Self::MalformedTag { name, .. }
            | Self::InvalidProps { name, .. } => name,
            Self::MismatchedClose { found, .. } => found,
        }
    }
}

/// Result type for compile operations.
pub type Result<T> = std::result::Result<T, CompileError>;

/// One node of a compiled body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Rendered HTML.
    Html { html: String },

    /// Embedded component, rendered at page time.
    Component {
        name: String,
        props: Props,
        children: Vec<Node>,
    },
}

/// Compiled form of a document body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompiledBody {
    /// Top-level nodes in document order.
    pub nodes: Vec<Node>,

    /// Component names referenced anywhere in the body.
    pub components: BTreeSet<String>,

    /// Table of contents extracted from headings.
    pub toc: Vec<TocEntry>,
}

impl CompiledBody {
    /// Render to HTML, substituting components from `registry`.
    pub fn render(&self, registry: &ComponentRegistry) -> Result<String> {
        let mut html = String::new();
        render_nodes(&self.nodes, registry, &mut html)?;
        Ok(html)
    }

    /// Serialize for caching or handing to another process.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn render_nodes(nodes: &[Node], registry: &ComponentRegistry, out: &mut String) -> Result<()> {
    for node in nodes {
        match node {
            Node::Html { html } => out.push_str(html),
            Node::Component {
                name,
                props,
                children,
            } => {
                let component =
                    registry
                        .get(name)
                        .ok_or_else(|| CompileError::UnknownComponent {
                            name: name.clone(),
                        })?;
                let mut inner = String::new();
                render_nodes(children, registry, &mut inner)?;
                out.push_str(&component.render(props, &inner));
            }
        }
    }
    Ok(())
}

/// MDX compiler with syntax highlighting support.
#[derive(Debug)]
pub struct MdxCompiler {
    highlighter: SyntaxHighlighter,
    options: Options,
}

impl Default for MdxCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl MdxCompiler {
    /// Create a new compiler with default options.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            highlighter: SyntaxHighlighter::default(),
            options,
        }
    }

    /// Create a compiler with a custom syntax theme.
    pub fn with_theme(theme: &str) -> Self {
        let mut compiler = Self::new();
        compiler.highlighter.set_theme(theme);
        compiler
    }

    /// Compile an MDX body, resolving component tags against `registry`.
    pub fn compile(&self, body: &str, registry: &ComponentRegistry) -> Result<CompiledBody> {
        self.run(body, Some(registry))
    }

    /// Compile plain Markdown. Component-looking tags stay raw HTML.
    pub fn compile_markdown(&self, body: &str) -> CompiledBody {
        // Without a registry no tag is ever interpreted, so nothing can fail.
        self.run(body, None).unwrap_or_default()
    }

    fn run(&self, body: &str, registry: Option<&ComponentRegistry>) -> Result<CompiledBody> {
        let (source, tags) = match registry {
            Some(_) => extract_component_tags(body)?,
            None => (body.to_string(), Vec::new()),
        };
        let mut out = Emitter::new(registry, tags);
        let mut toc = Vec::new();
        let mut anchors: HashMap<String, usize> = HashMap::new();

        let mut heading: Option<HeadingState> = None;
        let mut code_block: Option<(Option<String>, String)> = None;
        let mut html_block: Option<String> = None;
        let mut image: Option<ImageState> = None;
        let mut in_table_head = false;

        for event in Parser::new_ext(&source, self.options) {
            if let Some(img) = image.as_mut() {
                match event {
                    Event::End(TagEnd::Image) => {
                        let img = image.take().unwrap_or_default();
                        let title = if img.title.is_empty() {
                            String::new()
                        } else {
                            format!(r#" title="{}""#, html_escape(&img.title))
                        };
                        out.push(&format!(
                            r#"<img src="{}" alt="{}"{title} loading="lazy" />"#,
                            html_escape(&img.src),
                            html_escape(&img.alt)
                        ));
                    }
                    Event::Text(text) | Event::Code(text) => {
                        img.alt.push_str(&out.restore(&text));
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::Heading {
                    level, id, classes, ..
                }) => {
                    let lvl = level as u8;
                    let mut open = format!("<h{lvl}");
                    if !classes.is_empty() {
                        let classes: Vec<&str> = classes.iter().map(|c| c.as_ref()).collect();
                        open.push_str(&format!(r#" class="{}""#, html_escape(&classes.join(" "))));
                    }
                    out.push(&open);
                    let mark = out.mark();
                    out.push(">");
                    heading = Some(HeadingState {
                        level,
                        id: id.map(|i| i.to_string()),
                        text: String::new(),
                        mark,
                    });
                }

                Event::End(TagEnd::Heading(level)) => {
                    if let Some(state) = heading.take() {
                        let base = state.id.unwrap_or_else(|| slugify(&state.text));
                        let id = unique_anchor(&mut anchors, base);
                        out.insert_at(state.mark, &format!(r#" id="{}""#, html_escape(&id)));
                        toc.push(TocEntry {
                            level: state.level as u8,
                            text: state.text.trim().to_string(),
                            id,
                        });
                    }
                    out.push(&format!("</h{}>\n", level as u8));
                }

                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(str::to_string)
                            .filter(|l| !l.is_empty()),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }

                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = code_block.take() {
                        out.push(&self.highlighter.highlight(&code, lang.as_deref()));
                    }
                }

                Event::Text(text) if code_block.is_some() => {
                    let text = out.restore(&text).into_owned();
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }

                Event::Start(Tag::HtmlBlock) => html_block = Some(String::new()),

                Event::End(TagEnd::HtmlBlock) => {
                    if let Some(raw) = html_block.take() {
                        out.raw_html(&raw)?;
                    }
                }

                Event::Html(raw) if html_block.is_some() => {
                    if let Some(block) = html_block.as_mut() {
                        block.push_str(&raw);
                    }
                }

                Event::Html(raw) | Event::InlineHtml(raw) => out.raw_html(&raw)?,

                Event::Text(text) => {
                    if let Some(state) = heading.as_mut() {
                        state.text.push_str(&text);
                    }
                    out.push(&html_escape(&text));
                }

                Event::Code(code) => {
                    let code = out.restore(&code).into_owned();
                    if let Some(state) = heading.as_mut() {
                        state.text.push_str(&code);
                    }
                    out.push(&format!("<code>{}</code>", html_escape(&code)));
                }

                Event::Start(Tag::Image {
                    dest_url, title, ..
                }) => {
                    image = Some(ImageState {
                        src: dest_url.to_string(),
                        title: title.to_string(),
                        alt: String::new(),
                    });
                }

                Event::Start(Tag::TableHead) => {
                    in_table_head = true;
                    out.push("<thead><tr>");
                }

                Event::End(TagEnd::TableHead) => {
                    in_table_head = false;
                    out.push("</tr></thead>\n<tbody>\n");
                }

                Event::Start(Tag::TableCell) => {
                    out.push(if in_table_head { "<th>" } else { "<td>" });
                }

                Event::End(TagEnd::TableCell) => {
                    out.push(if in_table_head { "</th>" } else { "</td>" });
                }

                Event::SoftBreak => out.push("\n"),
                Event::HardBreak => out.push("<br />\n"),
                Event::Rule => out.push("<hr />\n"),

                Event::FootnoteReference(name) => {
                    let name = html_escape(&name);
                    out.push(&format!(
                        r##"<sup class="footnote-ref"><a href="#fn-{name}">[{name}]</a></sup>"##
                    ));
                }

                Event::TaskListMarker(checked) => out.push(if checked {
                    r#"<input type="checkbox" checked disabled /> "#
                } else {
                    r#"<input type="checkbox" disabled /> "#
                }),

                Event::InlineMath(math) => out.push(&format!(
                    r#"<span class="math inline">\({}\)</span>"#,
                    html_escape(&math)
                )),

                Event::DisplayMath(math) => out.push(&format!(
                    r#"<div class="math display">\[{}\]</div>"#,
                    html_escape(&math)
                )),

                Event::Start(tag) => out.push(&tag_to_html_start(&tag)),
                Event::End(tag) => out.push(&tag_to_html_end(&tag)),
            }
        }

        let (nodes, components) = out.finish()?;
        Ok(CompiledBody {
            nodes,
            components,
            toc,
        })
    }
}

struct HeadingState {
    level: HeadingLevel,
    id: Option<String>,
    text: String,
    /// Where the `id` attribute goes.
    mark: Mark,
}

/// A position in the emitter output: frame depth, child count and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mark {
    depth: usize,
    children: usize,
    offset: usize,
}

#[derive(Default)]
struct ImageState {
    src: String,
    title: String,
    alt: String,
}

fn unique_anchor(seen: &mut HashMap<String, usize>, base: String) -> String {
    let base = if base.is_empty() {
        "section".to_string()
    } else {
        base
    };
    let count = seen.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{base}-{}", *count - 1)
    }
}

/// A component whose children are still being collected.
#[derive(Debug, Default)]
struct Frame {
    name: String,
    props: Props,
    children: Vec<Node>,
    html: String,
}

impl Frame {
    fn flush(&mut self) {
        if !self.html.is_empty() {
            let html = std::mem::take(&mut self.html);
            self.children.push(Node::Html { html });
        }
    }
}

/// Builds the node tree while the markdown events stream by.
struct Emitter<'r> {
    registry: Option<&'r ComponentRegistry>,
    tags: Vec<ExtractedTag>,
    root: Frame,
    stack: Vec<Frame>,
    used: BTreeSet<String>,
}

impl<'r> Emitter<'r> {
    fn new(registry: Option<&'r ComponentRegistry>, tags: Vec<ExtractedTag>) -> Self {
        Self {
            registry,
            tags,
            root: Frame::default(),
            stack: Vec::new(),
            used: BTreeSet::new(),
        }
    }

    /// Put the original tag text back where a placeholder ended up as text,
    /// e.g. inside an indented code block.
    fn restore<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if self.tags.is_empty() || !text.contains(PLACEHOLDER_PREFIX) {
            return Cow::Borrowed(text);
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some((pos, index, len)) = find_placeholder(rest) {
            out.push_str(&rest[..pos]);
            match self.tags.get(index) {
                Some(tag) => out.push_str(&tag.source),
                None => out.push_str(&rest[pos..pos + len]),
            }
            rest = &rest[pos + len..];
        }
        out.push_str(rest);
        Cow::Owned(out)
    }

    fn current(&mut self) -> &mut Frame {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    fn push(&mut self, html: &str) {
        self.current().html.push_str(html);
    }

    /// Whitespace around component tags carries no content.
    fn push_segment(&mut self, html: &str) {
        if !html.trim().is_empty() {
            self.push(html);
        }
    }

    fn mark(&self) -> Mark {
        let frame = self.stack.last().unwrap_or(&self.root);
        Mark {
            depth: self.stack.len(),
            children: frame.children.len(),
            offset: frame.html.len(),
        }
    }

    /// Insert at an earlier mark. Skipped once a component boundary lies
    /// between the mark and the current position.
    fn insert_at(&mut self, mark: Mark, html: &str) {
        if mark.depth != self.stack.len() {
            return;
        }
        let frame = self.current();
        if mark.children == frame.children.len()
            && mark.offset <= frame.html.len()
            && frame.html.is_char_boundary(mark.offset)
        {
            frame.html.insert_str(mark.offset, html);
        }
    }

    /// Feed raw HTML, pulling out component tags.
    fn raw_html(&mut self, raw: &str) -> Result<()> {
        if self.registry.is_none() {
            self.push(raw);
            return Ok(());
        }

        let mut rest = raw;
        let mut found = false;
        while let Some((pos, index, len)) = find_placeholder(rest) {
            found = true;
            self.push_segment(&rest[..pos]);
            match self.tags.get(index).map(|t| t.token.clone()) {
                Some(TagToken::Open {
                    name,
                    props,
                    self_closing,
                }) => self.open(name, props, self_closing)?,
                Some(TagToken::Close { name }) => self.close(name)?,
                None => self.push(&rest[pos..pos + len]),
            }
            rest = &rest[pos + len..];
        }
        if found {
            self.push_segment(rest);
        } else {
            self.push(rest);
        }
        Ok(())
    }

    fn open(&mut self, name: String, props: Props, self_closing: bool) -> Result<()> {
        let Some(component) = self.registry.and_then(|r| r.get(&name)) else {
            return Err(CompileError::UnknownComponent { name });
        };
        component
            .validate(&props)
            .map_err(|reason| CompileError::InvalidProps {
                name: name.clone(),
                reason,
            })?;

        self.used.insert(name.clone());

        if self_closing {
            let frame = self.current();
            frame.flush();
            frame.children.push(Node::Component {
                name,
                props,
                children: Vec::new(),
            });
        } else {
            self.current().flush();
            self.stack.push(Frame {
                name,
                props,
                ..Frame::default()
            });
        }
        Ok(())
    }

    fn close(&mut self, name: String) -> Result<()> {
        let Some(mut frame) = self.stack.pop() else {
            return Err(CompileError::UnexpectedClose { name });
        };
        if frame.name != name {
            return Err(CompileError::MismatchedClose {
                expected: frame.name,
                found: name,
            });
        }

        frame.flush();
        let parent = self.current();
        parent.flush();
        parent.children.push(Node::Component {
            name: frame.name,
            props: frame.props,
            children: trim_children(frame.children),
        });
        Ok(())
    }

    fn finish(mut self) -> Result<(Vec<Node>, BTreeSet<String>)> {
        if let Some(frame) = self.stack.pop() {
            return Err(CompileError::Unclosed { name: frame.name });
        }
        self.root.flush();
        Ok((self.root.children, self.used))
    }
}

/// Drop whitespace-only HTML left between a component's tags and its content.
fn trim_children(children: Vec<Node>) -> Vec<Node> {
    children
        .into_iter()
        .filter(|node| !matches!(node, Node::Html { html } if html.trim().is_empty()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
enum TagToken {
    Open {
        name: String,
        props: Props,
        self_closing: bool,
    },
    Close {
        name: String,
    },
}

/// A component tag cut out of the body, with the text it was read from.
#[derive(Debug, Clone)]
struct ExtractedTag {
    token: TagToken,
    source: String,
}

const PLACEHOLDER_PREFIX: &str = "<folio-tag-";
const PLACEHOLDER_SUFFIX: &str = " />";

fn placeholder(index: usize) -> String {
    format!("{PLACEHOLDER_PREFIX}{index}{PLACEHOLDER_SUFFIX}")
}

/// Next placeholder in `s`: byte offset, tag index and length.
fn find_placeholder(s: &str) -> Option<(usize, usize, usize)> {
    let mut from = 0;
    while let Some(rel) = s[from..].find(PLACEHOLDER_PREFIX) {
        let pos = from + rel;
        let digits_start = pos + PLACEHOLDER_PREFIX.len();
        let digits = s[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let digits_end = digits_start + digits;
        if digits > 0
            && s[digits_end..].starts_with(PLACEHOLDER_SUFFIX)
            && let Ok(index) = s[digits_start..digits_end].parse()
        {
            return Some((pos, index, digits_end + PLACEHOLDER_SUFFIX.len() - pos));
        }
        from = digits_start;
    }
    None
}

/// Whether `s` starts with `<Name` or `</Name`.
fn starts_component_tag(s: &str) -> bool {
    let bytes = s.as_bytes();
    let next = match bytes.get(1) {
        Some(b'/') => bytes.get(2),
        other => other,
    };
    bytes.first() == Some(&b'<') && next.is_some_and(u8::is_ascii_uppercase)
}

/// Replace every component tag outside code with a placeholder.
///
/// Fenced code blocks, code spans and backslash-escaped `<` are copied
/// untouched.
fn extract_component_tags(body: &str) -> Result<(String, Vec<ExtractedTag>)> {
    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len());
    let mut tags = Vec::new();
    let mut fence: Option<(u8, usize)> = None;
    let mut pos = 0;

    while pos < body.len() {
        if pos == 0 || bytes[pos - 1] == b'\n' {
            let line_end = body[pos..].find('\n').map_or(body.len(), |i| pos + i + 1);
            let line = &body[pos..line_end];
            let in_code = match fence {
                Some(open) => {
                    if closes_fence(line, open) {
                        fence = None;
                    }
                    true
                }
                None => {
                    fence = opens_fence(line);
                    fence.is_some()
                }
            };
            if in_code {
                out.push_str(line);
                pos = line_end;
                continue;
            }
        }

        let rest = &body[pos..];
        let copied = match bytes[pos] {
            b'`' => {
                let run = rest.bytes().take_while(|b| *b == b'`').count();
                run + code_span_len(&rest[run..], run).unwrap_or(0)
            }
            b'\\' => 1 + rest[1..].chars().next().map_or(0, char::len_utf8),
            b'<' if starts_component_tag(rest) => {
                let (token, len) = read_tag(rest)?;
                out.push_str(&placeholder(tags.len()));
                tags.push(ExtractedTag {
                    token,
                    source: rest[..len].to_string(),
                });
                pos += len;
                continue;
            }
            _ => rest.chars().next().map_or(1, char::len_utf8),
        };
        out.push_str(&rest[..copied]);
        pos += copied;
    }

    Ok((out, tags))
}

/// Opening code fence: up to three spaces, then three or more `` ` `` or `~`.
fn opens_fence(line: &str) -> Option<(u8, usize)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let ch = *trimmed.as_bytes().first()?;
    if ch != b'`' && ch != b'~' {
        return None;
    }
    let run = trimmed.bytes().take_while(|b| *b == ch).count();
    if run < 3 || (ch == b'`' && trimmed[run..].contains('`')) {
        return None;
    }
    Some((ch, run))
}

fn closes_fence(line: &str, (ch, len): (u8, usize)) -> bool {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return false;
    }
    let run = trimmed.bytes().take_while(|b| *b == ch).count();
    run >= len && trimmed[run..].trim().is_empty()
}

/// Length of a code span's content plus its closing backtick run, if it
/// closes before the paragraph ends.
fn code_span_len(s: &str, run: usize) -> Option<usize> {
    let limit = s.find("\n\n").unwrap_or(s.len());
    let bytes = &s.as_bytes()[..limit];
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let len = bytes[i..].iter().take_while(|b| **b == b'`').count();
            if len == run {
                return Some(i + len);
            }
            i += len;
        } else {
            i += 1;
        }
    }
    None
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Read one component tag at the start of `s`; returns it and its length.
fn read_tag(s: &str) -> Result<(TagToken, usize)> {
    let bytes = s.as_bytes();
    let closing = bytes.get(1) == Some(&b'/');
    let name_start = if closing { 2 } else { 1 };
    let name_len = bytes[name_start..]
        .iter()
        .take_while(|b| is_name_byte(**b))
        .count();
    let name = s[name_start..name_start + name_len].to_string();
    let attrs_start = name_start + name_len;

    if closing {
        let after = &s[attrs_start..];
        let trimmed = after.trim_start();
        if !trimmed.starts_with('>') {
            return Err(CompileError::MalformedTag {
                name,
                reason: "closing tag must end with `>`".to_string(),
            });
        }
        let len = attrs_start + (after.len() - trimmed.len()) + 1;
        return Ok((TagToken::Close { name }, len));
    }

    let end = find_tag_end(&s[attrs_start..]).ok_or_else(|| CompileError::MalformedTag {
        name: name.clone(),
        reason: "tag is not terminated".to_string(),
    })?;
    let inner = &s[attrs_start..attrs_start + end];
    let (attrs, self_closing) = match inner.trim_end().strip_suffix('/') {
        Some(attrs) => (attrs, true),
        None => (inner, false),
    };

    let props = parse_props(&name, attrs)?;
    Ok((
        TagToken::Open {
            name,
            props,
            self_closing,
        },
        attrs_start + end + 1,
    ))
}

/// Offset of the `>` that ends a tag, skipping quoted and braced values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut depth = 0usize;

    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') => depth = depth.saturating_sub(1),
            (None, '>') if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parse `key="v" key='v' key={json} flag` into props.
fn parse_props(tag: &str, src: &str) -> Result<Props> {
    let invalid = |reason: String| CompileError::InvalidProps {
        name: tag.to_string(),
        reason,
    };

    let mut props = Props::new();
    let mut rest = src.trim_start();

    while !rest.is_empty() {
        let key_len = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let key = &rest[..key_len];
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ':'))
        {
            return Err(invalid(format!("unexpected `{}`", rest.trim_end())));
        }
        rest = rest[key_len..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, consumed) = read_prop_value(after_eq).map_err(|reason| {
                invalid(format!("prop `{key}`: {reason}"))
            })?;
            rest = after_eq[consumed..].trim_start();
            value
        } else {
            Value::Bool(true)
        };

        props.insert(key.to_string(), value);
    }

    Ok(props)
}

fn read_prop_value(s: &str) -> std::result::Result<(Value, usize), String> {
    let Some(first) = s.chars().next() else {
        return Err("missing value".to_string());
    };

    match first {
        '"' | '\'' => {
            let close = s[1..]
                .find(first)
                .ok_or_else(|| "unterminated string".to_string())?;
            Ok((Value::String(s[1..1 + close].to_string()), close + 2))
        }
        '{' => {
            let end = matching_brace(s).ok_or_else(|| "unbalanced `{`".to_string())?;
            let expr = s[1..end].trim();
            let value = serde_json::from_str(expr)
                .map_err(|e| format!("expression `{expr}` is not a literal: {e}"))?;
            Ok((value, end + 1))
        }
        _ => {
            let len = s.find(char::is_whitespace).unwrap_or(s.len());
            Ok((Value::String(s[..len].to_string()), len))
        }
    }
}

fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Convert a pulldown-cmark tag to HTML opening tag.
fn tag_to_html_start(tag: &Tag) -> String {
    match tag {
        Tag::Paragraph => "<p>".to_string(),
        Tag::BlockQuote(_) => "<blockquote>\n".to_string(),
        Tag::List(Some(1)) => "<ol>\n".to_string(),
        Tag::List(Some(start)) => format!("<ol start=\"{start}\">\n"),
        Tag::List(None) => "<ul>\n".to_string(),
        Tag::Item => "<li>".to_string(),
        Tag::FootnoteDefinition(name) => {
            format!("<div class=\"footnote\" id=\"fn-{}\">", html_escape(name))
        }
        Tag::Table(_) => "<table>".to_string(),
        Tag::TableRow => "<tr>".to_string(),
        Tag::Emphasis => "<em>".to_string(),
        Tag::Strong => "<strong>".to_string(),
        Tag::Strikethrough => "<del>".to_string(),
        Tag::Link {
            dest_url, title, ..
        } => {
            let title_attr = if title.is_empty() {
                String::new()
            } else {
                format!(" title=\"{}\"", html_escape(title))
            };
            format!("<a href=\"{}\"{title_attr}>", html_escape(dest_url))
        }
        Tag::DefinitionList => "<dl>".to_string(),
        Tag::DefinitionListTitle => "<dt>".to_string(),
        Tag::DefinitionListDefinition => "<dd>".to_string(),
        Tag::Superscript => "<sup>".to_string(),
        Tag::Subscript => "<sub>".to_string(),
        // Headings, code blocks, images, tables heads/cells and HTML blocks
        // are handled by the event loop.
        Tag::Heading { .. }
        | Tag::CodeBlock(_)
        | Tag::Image { .. }
        | Tag::TableHead
        | Tag::TableCell
        | Tag::HtmlBlock
        | Tag::MetadataBlock(_) => String::new(),
    }
}

/// Convert a pulldown-cmark tag end to HTML closing tag.
fn tag_to_html_end(tag: &TagEnd) -> String {
    match tag {
        TagEnd::Paragraph => "</p>\n".to_string(),
        TagEnd::BlockQuote(_) => "</blockquote>\n".to_string(),
        TagEnd::List(true) => "</ol>\n".to_string(),
        TagEnd::List(false) => "</ul>\n".to_string(),
        TagEnd::Item => "</li>\n".to_string(),
        TagEnd::FootnoteDefinition => "</div>\n".to_string(),
        TagEnd::Table => "</tbody></table>\n".to_string(),
        TagEnd::TableRow => "</tr>\n".to_string(),
        TagEnd::Emphasis => "</em>".to_string(),
        TagEnd::Strong => "</strong>".to_string(),
        TagEnd::Strikethrough => "</del>".to_string(),
        TagEnd::Link => "</a>".to_string(),
        TagEnd::DefinitionList => "</dl>\n".to_string(),
        TagEnd::DefinitionListTitle => "</dt>\n".to_string(),
        TagEnd::DefinitionListDefinition => "</dd>\n".to_string(),
        TagEnd::Superscript => "</sup>".to_string(),
        TagEnd::Subscript => "</sub>".to_string(),
        TagEnd::Heading(_)
        | TagEnd::CodeBlock
        | TagEnd::Image
        | TagEnd::TableHead
        | TagEnd::TableCell
        | TagEnd::HtmlBlock
        | TagEnd::MetadataBlock(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn compile(body: &str) -> Result<CompiledBody> {
        MdxCompiler::new().compile(body, &ComponentRegistry::with_builtins())
    }

    fn render(body: &str) -> String {
        let registry = ComponentRegistry::with_builtins();
        MdxCompiler::new()
            .compile(body, &registry)
            .unwrap()
            .render(&registry)
            .unwrap()
    }

    #[test]
    fn test_heading_renders_with_anchor() {
        let compiled = compile("# Hi there").unwrap();
        let html = compiled.render(&ComponentRegistry::new()).unwrap();

        assert_eq!(html, "<h1 id=\"hi-there\">Hi there</h1>\n");
        assert_eq!(compiled.toc.len(), 1);
        assert_eq!(compiled.toc[0].text, "Hi there");
        assert_eq!(compiled.toc[0].level, 1);
        assert!(compiled.components.is_empty());
    }

    #[test]
    fn test_duplicate_heading_anchors() {
        let compiled = compile("## Notes\n\n## Notes\n\n## Notes {#custom}").unwrap();
        let ids: Vec<_> = compiled.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["notes", "notes-1", "custom"]);
    }

    #[test]
    fn test_block_component_wraps_markdown() {
        let body = "Intro.\n\n<Callout type=\"warning\">\n\nSome **bold** advice.\n\n</Callout>\n\nOutro.";
        let compiled = compile(body).unwrap();

        assert_eq!(
            compiled.components.iter().collect::<Vec<_>>(),
            vec!["Callout"]
        );
        let component = compiled
            .nodes
            .iter()
            .find_map(|n| match n {
                Node::Component {
                    name,
                    props,
                    children,
                } => Some((name, props, children)),
                Node::Html { .. } => None,
            })
            .expect("component node");
        assert_eq!(component.0, "Callout");
        assert_eq!(component.1.get("type"), Some(&json!("warning")));
        assert_eq!(
            component.2,
            &vec![Node::Html {
                html: "<p>Some <strong>bold</strong> advice.</p>\n".to_string()
            }]
        );

        let html = compiled.render(&ComponentRegistry::with_builtins()).unwrap();
        assert!(html.starts_with("<p>Intro.</p>"));
        assert!(html.contains("callout-warning"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.trim_end().ends_with("<p>Outro.</p>"));
    }

    #[test]
    fn test_self_closing_component_with_json_props() {
        let compiled = compile("<Sketch src=\"/sketches/flow.js\" height={480} />").unwrap();
        assert_eq!(
            compiled.nodes,
            vec![Node::Component {
                name: "Sketch".to_string(),
                props: [
                    ("height".to_string(), json!(480)),
                    ("src".to_string(), json!("/sketches/flow.js")),
                ]
                .into_iter()
                .collect(),
                children: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_inline_component() {
        let html = render("Watch <YouTube id=\"abc123\" /> now.");
        assert!(html.starts_with("<p>Watch "));
        assert!(html.contains("youtube-nocookie.com/embed/abc123"));
        assert!(html.contains(" now.</p>"));
    }

    #[test]
    fn test_unknown_component_is_error() {
        let err = compile("Hello\n\n<Chart data=\"x\" />\n").unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownComponent {
                name: "Chart".to_string()
            }
        );
        assert_eq!(err.tag(), "Chart");
        assert!(err.to_string().contains("Chart"));
    }

    #[test]
    fn test_unknown_inline_component_is_error() {
        let err = compile("text <Badge /> text").unwrap_err();
        assert_eq!(err.tag(), "Badge");
    }

    #[test]
    fn test_unbalanced_tags() {
        assert!(matches!(
            compile("<Callout>\n\nbody\n").unwrap_err(),
            CompileError::Unclosed { .. }
        ));
        assert!(matches!(
            compile("body\n\n</Callout>\n").unwrap_err(),
            CompileError::UnexpectedClose { .. }
        ));
        assert!(matches!(
            compile("<Callout>\n\nbody\n\n</Figure>\n").unwrap_err(),
            CompileError::MismatchedClose { .. }
        ));
    }

    #[test]
    fn test_invalid_props() {
        assert!(matches!(
            compile("<Figure alt=\"no source\" />").unwrap_err(),
            CompileError::InvalidProps { .. }
        ));
        assert!(matches!(
            compile("<Sketch src=\"/a.js\" height={nope} />").unwrap_err(),
            CompileError::InvalidProps { .. }
        ));
    }

    #[test]
    fn test_lowercase_html_passes_through() {
        let html = render("<div class=\"note\">\nraw\n</div>\n");
        assert_eq!(html, "<div class=\"note\">\nraw\n</div>\n");
    }

    #[test]
    fn test_markdown_mode_ignores_components() {
        let compiled = MdxCompiler::new().compile_markdown("<Chart />\n");
        assert!(compiled.components.is_empty());
        let html = compiled.render(&ComponentRegistry::new()).unwrap();
        assert!(html.contains("<Chart />"));
    }

    #[test]
    fn test_code_block_not_scanned_for_components() {
        let compiled = compile("```jsx\n<Unknown />\n```").unwrap();
        assert!(compiled.components.is_empty());
        let html = compiled.render(&ComponentRegistry::new()).unwrap();
        assert!(html.contains("Unknown"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let body = "# Title\n\n<Callout title=\"t\">\n\nText\n\n</Callout>\n\n| a | b |\n|---|---|\n| 1 | 2 |\n";
        let first = compile(body).unwrap();
        let second = compile(body).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn test_compiled_body_serializes() {
        let compiled = compile("<YouTube id=\"x\" />").unwrap();
        let json = compiled.to_json().unwrap();
        let back: CompiledBody = serde_json::from_str(&json).unwrap();
        assert_eq!(back, compiled);
        assert!(json.contains("\"type\":\"component\""));
    }

    #[test]
    fn test_image_alt_text() {
        let html = render("![A \"cat\"](/img/cat.png \"Title\")");
        assert!(html.contains(r#"<img src="/img/cat.png" alt="A &quot;cat&quot;" title="Title""#));
    }

    #[test]
    fn test_table_rendering() {
        let html = render("| H1 | H2 |\n|----|----|\n| C1 | C2 |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>H1</th>"));
        assert!(html.contains("<td>C1</td>"));
    }

    #[test]
    fn test_task_list() {
        let html = render("- [x] Done\n- [ ] Not done");
        assert!(html.contains("checkbox"));
        assert!(html.contains("checked"));
    }

    #[test]
    fn test_parse_props_forms() {
        let props = parse_props("X", r#" a="1" b='two' c={[1,2]} d e=plain "#).unwrap();
        assert_eq!(props.get("a"), Some(&json!("1")));
        assert_eq!(props.get("b"), Some(&json!("two")));
        assert_eq!(props.get("c"), Some(&json!([1, 2])));
        assert_eq!(props.get("d"), Some(&json!(true)));
        assert_eq!(props.get("e"), Some(&json!("plain")));
    }

    fn chart_registry() -> ComponentRegistry {
        let mut registry = ComponentRegistry::with_builtins();
        registry.register(
            "Chart",
            crate::registry::ElementComponent::new("div", Some("chart".to_string())),
        );
        registry
    }

    #[test]
    fn test_json_props_reach_registered_component() {
        let registry = chart_registry();
        let body = "<Chart data={[\"a\", \"b\"]} opts={{\"stacked\": true, \"label\": \"x y\"}} title={\"Sales\"} />\n";

        let compiled = MdxCompiler::new().compile(body, &registry).unwrap();

        assert_eq!(
            compiled.nodes,
            vec![Node::Component {
                name: "Chart".to_string(),
                props: [
                    ("data".to_string(), json!(["a", "b"])),
                    ("opts".to_string(), json!({"stacked": true, "label": "x y"})),
                    ("title".to_string(), json!("Sales")),
                ]
                .into_iter()
                .collect(),
                children: Vec::new(),
            }]
        );
        let html = compiled.render(&registry).unwrap();
        assert!(html.starts_with(r#"<div class="chart""#));
        assert!(!html.contains("&lt;Chart"));
    }

    #[test]
    fn test_unknown_component_with_json_props_is_error() {
        for body in [
            "<Chart data={[\"a\", \"b\"]} />\n",
            "<Chart config={{\"speed\": 2}} />\n",
            "<Chart label={\"two words\"} />\n",
            "Inline <Chart data={[1, 2]} /> tag.\n",
        ] {
            let err = compile(body).unwrap_err();
            assert_eq!(
                err,
                CompileError::UnknownComponent {
                    name: "Chart".to_string()
                },
                "{body}"
            );
        }
    }

    #[test]
    fn test_spaced_and_object_props_on_builtin() {
        let compiled =
            compile("<Sketch src=\"/a.js\" height={ 480 } params={{\"speed\": 2}} />\n").unwrap();

        assert!(compiled.components.contains("Sketch"));
        let Node::Component { props, .. } = &compiled.nodes[0] else {
            panic!("expected component, got {:?}", compiled.nodes);
        };
        assert_eq!(props.get("height"), Some(&json!(480)));
        assert_eq!(props.get("params"), Some(&json!({"speed": 2})));
    }

    #[test]
    fn test_multiline_tag_with_object_prop() {
        let body = "<Sketch\n  src=\"/a.js\"\n  params={{\n    \"speed\": 2\n  }}\n/>\n";
        let compiled = compile(body).unwrap();
        assert_eq!(compiled.components.len(), 1);
        assert!(render(body).contains(r#"data-sketch="/a.js""#));
    }

    #[test]
    fn test_tags_in_code_stay_literal() {
        let html = render("Use `<Chart data={[1]} />` here.\n\n    <Chart />\n");
        assert!(html.contains("<code>&lt;Chart data={[1]} /&gt;</code>"));
        assert!(html.contains("Chart"));
        assert!(!html.contains("folio-tag"));
    }

    #[test]
    fn test_escaped_tag_is_text() {
        let html = render("\\<Chart /> is literal.");
        assert!(html.contains("&lt;Chart /&gt; is literal."));
    }

    #[test]
    fn test_render_with_missing_component_fails() {
        let compiled = compile("<Callout>\n\nx\n\n</Callout>").unwrap();
        assert!(matches!(
            compiled.render(&ComponentRegistry::new()),
            Err(CompileError::UnknownComponent { .. })
        ));
    }
}
