//! URL helpers for link resolution and URL-derived titles.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::{ReadmarkError, Result};

/// Extensions of saved or served documents; other dotted suffixes are part of the name
static TRAILING_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(?:s?html?|xhtml|php\d?|aspx?|jspx?|cgi|md|markdown|txt|pdf|xml|json)$")
        .expect("valid extension regex")
});

/// Parse a source URL usable as a base for relative links.
///
/// # Errors
///
/// Returns [`ReadmarkError::InvalidUrl`] when the source is not an absolute
/// URL that can serve as a base (file paths, `mailto:` and the like).
pub fn parse_base_url(source: &str) -> Result<Url> {
    let source = source.trim();
    match Url::parse(source) {
        Ok(url) if !url.cannot_be_a_base() => Ok(url),
        _ => Err(ReadmarkError::InvalidUrl(source.to_string())),
    }
}

/// Resolve a link destination for Markdown output.
///
/// Absolute destinations and fragment links are kept as written; relative
/// ones are joined with `base` when there is one. Returns `None` for empty
/// and `javascript:` destinations.
pub fn resolve_link(href: &str, base: Option<&Url>) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.get(..11).is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:")) {
        return None;
    }

    let resolved = if href.starts_with('#') || Url::parse(href).is_ok() {
        href.to_string()
    } else {
        match base.map(|base| base.join(href)) {
            Some(Ok(url)) => url.to_string(),
            _ => href.to_string(),
        }
    };

    Some(resolved.replace(' ', "%20"))
}

/// Derive a readable name from a source URL or file path.
///
/// Takes the last non-empty path segment, percent-decodes it and strips a
/// trailing document extension: `https://example.com/docs/Getting%20Started.html`
/// becomes `Getting Started`, while `node.js` stays as is.
pub fn name_from_source(source: &str) -> Option<String> {
    let source = source.trim();
    if source.is_empty() {
        return None;
    }

    let segment = match Url::parse(source).ok().filter(|url| !url.cannot_be_a_base()) {
        Some(url) => url.path_segments()?.filter(|segment| !segment.is_empty()).last().map(str::to_string)?,
        None => {
            let path = source.split(['?', '#']).next().unwrap_or_default();
            path.split(['/', '\\']).filter(|segment| !segment.is_empty()).last()?.to_string()
        }
    };

    let decoded = urlencoding::decode(&segment).map(|cow| cow.into_owned()).unwrap_or(segment);
    let name = TRAILING_EXTENSION.replace(&decoded, "");
    let name = name.trim();

    if name.is_empty() { None } else { Some(name.to_string()) }
}
