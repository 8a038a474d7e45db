//! Parser for the sectioned resource definition text format.
//!
//! ```text
//! [Namespace]
//! Keyword=HGNC
//! NameString=HGNC approved symbols
//!
//! [Processing]
//! CacheableFlag=yes
//! DelimiterString=|
//!
//! [Values]
//! AKT1|GRP
//! EGFR|GRP
//! ```
//!
//! Header sections hold `Key=Value` pairs. Every line after `[Values]` is a
//! `name<delimiter>value` pair; the value may be absent.

use std::collections::BTreeMap;

use crate::error::ResourceError;
use crate::{ResourceDescription, ResourceHeader};

const VALUES_SECTION: &str = "Values";
const DEFAULT_DELIMITER: &str = "|";
const CACHEABLE_FLAGS: &[&str] = &["yes", "Yes", "True", "true"];

type Sections = BTreeMap<String, BTreeMap<String, String>>;

/// Parse a definition file.
///
/// # Errors
///
/// Returns `ResourceError::Parse` on a header line without `=`, a line
/// outside any section, or a missing `[Values]` section.
pub fn parse_definition(text: &str) -> Result<ResourceDescription, ResourceError> {
    let mut sections: Sections = BTreeMap::new();
    let mut values: BTreeMap<String, String> = BTreeMap::new();
    let mut current: Option<String> = None;
    let mut saw_values = false;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            saw_values |= name == VALUES_SECTION;
            current = Some(name.to_string());
            continue;
        }

        match current.as_deref() {
            Some(VALUES_SECTION) => {
                let delimiter = sections
                    .get("Processing")
                    .and_then(|p| p.get("DelimiterString"))
                    .map_or(DEFAULT_DELIMITER, String::as_str);
                let (name, value) = line.split_once(delimiter).unwrap_or((line, ""));
                let name = name.trim();
                if !name.is_empty() {
                    values.insert(name.to_string(), value.trim().to_string());
                }
            }
            Some(section) => {
                let (key, value) = line.split_once('=').ok_or_else(|| {
                    ResourceError::Parse(format!(
                        "line {}: expected Key=Value in [{section}]",
                        lineno + 1
                    ))
                })?;
                sections
                    .entry(section.to_string())
                    .or_default()
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
            None => {
                return Err(ResourceError::Parse(format!(
                    "line {}: content before the first section header",
                    lineno + 1
                )));
            }
        }
    }

    if !saw_values {
        return Err(ResourceError::Parse("missing [Values] section".into()));
    }

    Ok(ResourceDescription {
        header: header_from(&sections),
        cachable: is_cachable(&sections),
        values,
        graph: None,
    })
}

/// A resource without a `CacheableFlag` is treated as cachable.
fn is_cachable(sections: &Sections) -> bool {
    sections
        .get("Processing")
        .and_then(|p| p.get("CacheableFlag"))
        .is_none_or(|flag| CACHEABLE_FLAGS.contains(&flag.as_str()))
}

fn header_from(sections: &Sections) -> ResourceHeader {
    let get = |section: &str, key: &str| -> Option<String> {
        sections
            .get(section)
            .and_then(|s| s.get(key))
            .filter(|v| !v.is_empty())
            .cloned()
    };
    let either = |key: &str| get("Namespace", key).or_else(|| get("AnnotationDefinition", key));

    ResourceHeader {
        keyword: either("Keyword"),
        name: get("Namespace", "NameString").or_else(|| get("Citation", "NameString")),
        domain: get("Namespace", "DomainString")
            .or_else(|| get("AnnotationDefinition", "TypeString")),
        version: either("VersionString"),
        description: either("DescriptionString"),
        author: get("Author", "NameString"),
        contact: get("Author", "ContactInfoString"),
        species: get("Namespace", "SpeciesString"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMESPACE: &str = include_str!("../tests/fixtures/hgnc.belns");

    #[test]
    fn parses_namespace_file() {
        let description = parse_definition(NAMESPACE).unwrap();
        assert!(description.cachable);
        assert_eq!(description.header.keyword.as_deref(), Some("HGNC"));
        assert_eq!(description.header.domain.as_deref(), Some("BiologicalProcess"));
        assert_eq!(description.header.author.as_deref(), Some("HGNC"));
        assert_eq!(description.values.len(), 3);
        assert_eq!(description.values["AKT1"], "GRP");
        assert_eq!(description.values["MIR21"], "");
    }

    #[test]
    fn custom_delimiter_and_annotation_header() {
        let text = "[AnnotationDefinition]\nKeyword=Species\nTypeString=list\n\
                    [Processing]\nCacheableFlag=no\nDelimiterString=;\n\
                    [Values]\n9606;Homo sapiens\n10090;Mus musculus\n";
        let description = parse_definition(text).unwrap();
        assert!(!description.cachable);
        assert_eq!(description.header.keyword.as_deref(), Some("Species"));
        assert_eq!(description.header.domain.as_deref(), Some("list"));
        assert_eq!(description.values["9606"], "Homo sapiens");
    }

    #[test]
    fn missing_values_section_is_an_error() {
        let err = parse_definition("[Namespace]\nKeyword=X\n").unwrap_err();
        assert!(matches!(err, ResourceError::Parse(_)));
    }

    #[test]
    fn header_line_without_equals_is_an_error() {
        let err = parse_definition("[Namespace]\nKeyword\n[Values]\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
