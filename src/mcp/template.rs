//! Compiled resource URI templates.
//!
//! A template like `zotero://items/{item_key}/citation/{style}` is compiled
//! once into its scheme plus an ordered list of literal and capture
//! segments. Matching a URI is a positional comparison of segments.

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// Values extracted from a matched URI, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures(Vec<(String, String)>);

impl Captures {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    scheme: String,
    segments: Vec<Segment>,
}

/// Split `scheme://a/b/c` into its scheme and path segments.
pub(crate) fn split_uri(uri: &str) -> Option<(&str, Vec<&str>)> {
    let (scheme, rest) = uri.split_once("://")?;
    if scheme.is_empty() || rest.is_empty() {
        return None;
    }
    Some((scheme, rest.split('/').collect()))
}

impl UriTemplate {
    pub fn compile(template: &str) -> Result<Self, RegistryError> {
        let malformed = |reason: &str| RegistryError::MalformedTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, parts) = split_uri(template).ok_or_else(|| malformed("expected scheme://path"))?;

        let mut segments = Vec::with_capacity(parts.len());
        for part in parts {
            if part.is_empty() {
                return Err(malformed("empty path segment"));
            }
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) => {
                    let valid = !name.is_empty()
                        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                    if !valid {
                        return Err(malformed("placeholder names must be [A-Za-z0-9_]+"));
                    }
                    if segments
                        .iter()
                        .any(|s| matches!(s, Segment::Capture(n) if n == name))
                    {
                        return Err(malformed("duplicate placeholder"));
                    }
                    Segment::Capture(name.to_string())
                }
                None if part.contains('{') || part.contains('}') => {
                    return Err(malformed("placeholders must span a whole segment"))
                }
                None => Segment::Literal(part.to_string()),
            };
            segments.push(segment);
        }

        if !segments.iter().any(|s| matches!(s, Segment::Capture(_))) {
            return Err(malformed("no placeholders"));
        }

        Ok(Self {
            raw: template.to_string(),
            scheme: scheme.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a concrete URI, extracting one non-empty value per placeholder.
    pub fn matches(&self, uri: &str) -> Option<Captures> {
        let (scheme, parts) = split_uri(uri)?;
        if scheme != self.scheme || parts.len() != self.segments.len() {
            return None;
        }

        let mut captures = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Capture(_) if part.is_empty() => return None,
                Segment::Capture(name) => captures.push((name.clone(), part.to_string())),
            }
        }
        Some(Captures(captures))
    }

    /// True when some URI would match both templates.
    pub fn overlaps(&self, other: &UriTemplate) -> bool {
        self.scheme == other.scheme
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    _ => true,
                })
    }
}

impl std::fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
