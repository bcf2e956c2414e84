//! Front matter splitting and parsing for content files.

use std::{collections::BTreeMap, path::Path};

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    content::Theme,
    error::{CoreError, Result},
};

/// Front matter metadata for content files.
///
/// Every key is optional. Consumers pick their own defaults through the
/// `*_or` accessors instead of looking keys up by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frontmatter {
    /// Entry title.
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,

    /// Short description used for meta tags and listings.
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,

    /// Publication date as written in the file (`publishedAt` or `date`).
    #[serde(
        default,
        alias = "date",
        alias = "published_at",
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<String>,

    /// Tags, written either as a list or a single string.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,

    /// Experience level of a sketch or tutorial (e.g. "beginner").
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub level: Option<String>,

    /// Thumbnail image path, relative to the site root.
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub thumbnail: Option<String>,

    /// Theme hint for the page (e.g. "dark").
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub theme: Option<String>,

    /// Whether this is a draft.
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "is_false"
    )]
    pub draft: bool,

    /// Keys without a dedicated field.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A front-matter value read without insisting on its YAML/TOML type.
///
/// Authors write `tags: [2023, art]` or `level: 2`; scalars are kept as
/// their text and anything structured is dropped.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(toml::value::Datetime),
    Other(serde::de::IgnoredAny),
}

impl Scalar {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(n) => Some(n.to_string()),
            Self::Text(s) => Some(s),
            Self::Date(d) => Some(d.to_string()),
            Self::Other(_) => None,
        }
    }

    fn truthy(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(n) => n != 0,
            Self::Float(n) => n != 0.0,
            Self::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "y" | "on" | "1"
            ),
            Self::Date(_) | Self::Other(_) => false,
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(Scalar::into_text))
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.is_some_and(Scalar::truthy))
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<Scalar>),
        One(Scalar),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(tag)) => tag.into_text().into_iter().collect(),
        Some(OneOrMany::Many(tags)) => tags.into_iter().filter_map(Scalar::into_text).collect(),
    })
}

impl Frontmatter {
    /// Title, or `fallback` when the file has none.
    #[must_use]
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(fallback)
    }

    /// Theme hint, or `default` when absent or unrecognized.
    #[must_use]
    pub fn theme_or(&self, default: Theme) -> Theme {
        self.theme
            .as_deref()
            .and_then(Theme::from_name)
            .unwrap_or(default)
    }

    /// Publication date, if present and in a recognized format.
    ///
    /// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `YYYY/MM/DD`.
    #[must_use]
    pub fn published_date(&self) -> Option<NaiveDate> {
        let raw = self.published_at.as_deref()?.trim();

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.date_naive())
            })
    }
}

/// Delimiter types for front matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// YAML front matter delimited by `---`.
    Yaml,
    /// TOML front matter delimited by `+++`.
    Toml,
}

impl FrontmatterFormat {
    /// Get the delimiter string for this format.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }

    fn from_delimiter(line: &str) -> Option<Self> {
        match line {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// A content file split at its front matter delimiters, before parsing.
///
/// All slices borrow from the original text, and concatenating them in order
/// gives that text back byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrontmatter<'a> {
    /// Format announced by the opening delimiter.
    pub format: FrontmatterFormat,
    /// Opening delimiter line, including its line ending.
    pub opening: &'a str,
    /// Metadata between the delimiters.
    pub matter: &'a str,
    /// Closing delimiter line, including its line ending if any.
    pub closing: &'a str,
    /// Everything after the closing delimiter.
    pub body: &'a str,
}

impl RawFrontmatter<'_> {
    /// Reassemble the original source text.
    #[must_use]
    pub fn to_source(&self) -> String {
        [self.opening, self.matter, self.closing, self.body].concat()
    }

    /// Parse the metadata block.
    pub fn parse(&self, path: &Path) -> Result<Frontmatter> {
        if self.matter.trim().is_empty() {
            return Ok(Frontmatter::default());
        }

        match self.format {
            FrontmatterFormat::Yaml => serde_yaml::from_str(self.matter)
                .map_err(|e| CoreError::frontmatter(path, e.to_string())),
            FrontmatterFormat::Toml => {
                toml::from_str(self.matter).map_err(|e| CoreError::frontmatter(path, e.to_string()))
            }
        }
    }
}

fn trim_line_end(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Split content into its front matter block and body.
///
/// Returns `Ok(None)` when the first line is not a delimiter; the whole text
/// is then body. An opening delimiter without a matching closing line is an
/// error.
pub fn split_frontmatter<'a>(content: &'a str, path: &Path) -> Result<Option<RawFrontmatter<'a>>> {
    let mut lines = content.split_inclusive('\n');

    let Some(opening) = lines.next() else {
        return Ok(None);
    };
    let Some(format) = FrontmatterFormat::from_delimiter(trim_line_end(opening)) else {
        return Ok(None);
    };

    let matter_start = opening.len();
    let mut offset = matter_start;

    for line in lines {
        if trim_line_end(line) == format.delimiter() {
            let body_start = offset + line.len();
            return Ok(Some(RawFrontmatter {
                format,
                opening,
                matter: &content[matter_start..offset],
                closing: &content[offset..body_start],
                body: &content[body_start..],
            }));
        }
        offset += line.len();
    }

    Err(CoreError::frontmatter(
        path,
        format!(
            "unterminated front matter: missing closing `{}`",
            format.delimiter()
        ),
    ))
}

/// Parse front matter from a content file.
///
/// Files without front matter yield an empty [`Frontmatter`] and the full
/// text as body.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let Some(raw) = split_frontmatter(content, path)? else {
        return Ok((Frontmatter::default(), content.to_string()));
    };

    let frontmatter = raw.parse(path)?;
    Ok((frontmatter, raw.body.to_string()))
}

/// Serialize front matter and join it with a body using `format` delimiters.
pub fn join_frontmatter(
    format: FrontmatterFormat,
    frontmatter: &Frontmatter,
    body: &str,
) -> Result<String> {
    let matter = match format {
        FrontmatterFormat::Yaml => serde_yaml::to_string(frontmatter)
            .map_err(|e| CoreError::config_with_source("failed to serialize front matter", e))?,
        FrontmatterFormat::Toml => toml::to_string(frontmatter)
            .map_err(|e| CoreError::config_with_source("failed to serialize front matter", e))?,
    };

    let delimiter = format.delimiter();
    let mut out = String::with_capacity(matter.len() + body.len() + 8);
    out.push_str(delimiter);
    out.push('\n');
    out.push_str(&matter);
    if !matter.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(delimiter);
    out.push('\n');
    out.push_str(body);
    Ok(out)
}
