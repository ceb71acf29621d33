//! Catalog response parser
//!
//! This module turns the catalog's XML responses into typed records:
//! - Text search results (`<results><texts><text>...`)
//! - Person lookups (`<results><persons><person>...`)
//!
//! Responses are parsed leniently with `scraper`: a malformed document or a
//! record missing required fields yields no data instead of an error.
//!
//! The HTML parser knows nothing about XML, so every element is renamed into
//! a custom element (`<title>` becomes `<xml-title>`) and self-closing tags
//! are expanded before parsing. Custom elements get no special treatment:
//! `<title/>` cannot swallow its siblings and `<title>` is not read as raw
//! text. CDATA sections are turned into escaped text.

use regex::{Captures, Regex};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Prefix given to every catalog element before HTML parsing
const TAG_PREFIX: &str = "xml-";

static XML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([A-Za-z_][\w.:-]*)([^<>]*?)(/?)>").unwrap());

static CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());

/// A text descriptor returned by a catalog search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCandidate {
    /// Catalog-assigned text ID
    pub text_id: i64,
    pub title: String,
    pub subtitle: String,
    /// Catalog-assigned author ID, if the text has one
    pub author_id: Option<i64>,
    pub year: Option<i32>,
}

/// Author metadata from a person lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    /// Display name (often a pen name)
    pub name: String,
    /// Real name; falls back to the display name
    pub original_name: String,
    /// Country name; falls back to `Unknown`
    pub country: String,
}

/// URL of the keyword search for a query key
pub fn search_url(base_url: &str, query: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &format!("{}/texts/search.xml", base_url.trim_end_matches('/')),
        &[("q", query)],
    )
}

/// URL of the exact-ID person lookup
pub fn person_url(base_url: &str, author_id: i64) -> Result<Url, url::ParseError> {
    let id = author_id.to_string();
    Url::parse_with_params(
        &format!("{}/persons/search.xml", base_url.trim_end_matches('/')),
        &[("q", id.as_str()), ("by", "id"), ("match", "exact")],
    )
}

/// URL of a text's downloadable package
pub fn package_url(download_url: &str, text_id: i64) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "{}/text/{}.txt.zip",
        download_url.trim_end_matches('/'),
        text_id
    ))
}

/// Parses a text search response
///
/// `<text>` records without a numeric `<id>` are dropped. Missing titles and
/// subtitles become empty strings; a missing or non-numeric author ID
/// becomes `None`.
///
/// # Example
///
/// ```
/// use chitanka_corpus::crawler::parse_search_results;
///
/// let xml = "<results><texts><text><id>1</id><title>Бай Ганьо</title>\
///            <author><id>7</id></author></text></texts></results>";
/// let texts = parse_search_results(xml);
/// assert_eq!(texts[0].text_id, 1);
/// assert_eq!(texts[0].author_id, Some(7));
/// ```
pub fn parse_search_results(xml: &str) -> Vec<TextCandidate> {
    let document = parse_xml(xml);
    let Ok(text_selector) = Selector::parse("xml-results > xml-texts > xml-text") else {
        return Vec::new();
    };

    document
        .select(&text_selector)
        .filter_map(|text| {
            let text_id = child_text(text, "id")?.parse().ok()?;
            let author_id = child(text, "author")
                .and_then(|author| child_text(author, "id"))
                .and_then(|id| id.parse().ok());

            Some(TextCandidate {
                text_id,
                title: child_text(text, "title").unwrap_or_default(),
                subtitle: child_text(text, "subtitle").unwrap_or_default(),
                author_id,
                year: child_text(text, "year").and_then(|y| y.parse().ok()),
            })
        })
        .collect()
}

/// Parses a person lookup response
///
/// Returns `None` unless the first `<person>` has a non-empty `<name>`.
pub fn parse_person(xml: &str) -> Option<PersonRecord> {
    let document = parse_xml(xml);
    let person_selector = Selector::parse("xml-results > xml-persons > xml-person").ok()?;
    let person = document.select(&person_selector).next()?;

    let name = child_text(person, "name").filter(|n| !n.is_empty())?;
    let original_name = child_text(person, "real-name")
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| name.clone());
    let country = child_text(person, "country")
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| crate::corpus::UNKNOWN_COUNTRY.to_string());

    Some(PersonRecord {
        name,
        original_name,
        country,
    })
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Rewrites catalog XML so the HTML parser builds the same element tree
fn xml_to_html(xml: &str) -> String {
    let xml = CDATA.replace_all(xml, |caps: &Captures| escape_text(&caps[1]));

    XML_TAG
        .replace_all(&xml, |caps: &Captures| {
            let (close, name, attrs) = (&caps[1], &caps[2], &caps[3]);
            if caps[4].is_empty() {
                format!("<{close}{TAG_PREFIX}{name}{attrs}>")
            } else {
                format!("<{TAG_PREFIX}{name}{attrs}></{TAG_PREFIX}{name}>")
            }
        })
        .into_owned()
}

fn parse_xml(xml: &str) -> Html {
    Html::parse_document(&xml_to_html(xml))
}

/// First direct child element with the given catalog tag name
fn child<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap).find(|c| {
        c.value()
            .name()
            .strip_prefix(TAG_PREFIX)
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    })
}

/// Trimmed text content of the first direct child with the given tag name
fn child_text(element: ElementRef<'_>, name: &str) -> Option<String> {
    child(element, name).map(|c| c.text().collect::<String>().trim().to_string())
}
