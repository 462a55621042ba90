//! Relationships: by-reference links serialized as URIs

use crate::error::{ConcertoError, Result};
use crate::util;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped in relationship identifiers: just enough to keep the
/// URI shape intact. Everything else (including `@`, `.`, `:`) passes
/// through unencoded.
const IDENTIFIER_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// The URI scheme for relationship references
const SCHEME: &str = "resource:";

/// A typed reference to an identifiable instance
///
/// A relationship encodes a reference, not ownership: it carries the target
/// declaration's FQN and the target's identifier, nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    class_fqn: String,
    identifier: String,
}

impl Relationship {
    /// Create a relationship to `<class_fqn>#<identifier>`
    pub fn new(class_fqn: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            class_fqn: class_fqn.into(),
            identifier: identifier.into(),
        }
    }

    /// The target declaration's fully qualified name
    pub fn class_fqn(&self) -> &str {
        &self.class_fqn
    }

    /// The target instance's identifier
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Render as `resource:<FQN>#<identifier>`
    pub fn to_uri(&self) -> String {
        format!(
            "{}{}#{}",
            SCHEME,
            self.class_fqn,
            utf8_percent_encode(&self.identifier, IDENTIFIER_ENCODE_SET)
        )
    }

    /// Parse a `resource:<FQN>#<identifier>` URI
    ///
    /// The namespace-less short form `resource:#<identifier>` is accepted
    /// when `default_fqn` supplies the target type.
    pub fn from_uri(uri: &str, default_fqn: Option<&str>) -> Result<Self> {
        let rest = uri.strip_prefix(SCHEME).ok_or_else(|| {
            ConcertoError::InvalidUri(format!("missing \"{}\" scheme in \"{}\"", SCHEME, uri))
        })?;
        let (type_part, fragment) = rest.split_once('#').ok_or_else(|| {
            ConcertoError::InvalidUri(format!("missing #identifier fragment in \"{}\"", uri))
        })?;
        let class_fqn = if type_part.is_empty() {
            default_fqn
                .ok_or_else(|| {
                    ConcertoError::InvalidUri(format!(
                        "\"{}\" names no type and no default type was supplied",
                        uri
                    ))
                })?
                .to_string()
        } else {
            type_part.to_string()
        };
        if util::get_short_name(&class_fqn).is_empty() {
            return Err(ConcertoError::InvalidUri(format!(
                "\"{}\" has an empty type name",
                uri
            )));
        }
        if fragment.is_empty() {
            return Err(ConcertoError::InvalidUri(format!(
                "\"{}\" has an empty identifier",
                uri
            )));
        }
        let identifier = percent_decode_str(fragment)
            .decode_utf8()
            .map_err(|e| {
                ConcertoError::InvalidUri(format!("identifier in \"{}\" is not UTF-8: {}", uri, e))
            })?
            .into_owned();
        Ok(Self {
            class_fqn,
            identifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_uri_plain() {
        let rel = Relationship::new("org.acme.sample.SampleParticipant", "alice@email.com");
        assert_eq!(
            rel.to_uri(),
            "resource:org.acme.sample.SampleParticipant#alice@email.com"
        );
    }

    #[test]
    fn test_to_uri_escapes_structural_characters() {
        let rel = Relationship::new("org.acme.Thing", "a#b c%d");
        assert_eq!(rel.to_uri(), "resource:org.acme.Thing#a%23b%20c%25d");
    }

    #[test]
    fn test_from_uri() {
        let rel =
            Relationship::from_uri("resource:org.acme.Thing#item-42", None).unwrap();
        assert_eq!(rel.class_fqn(), "org.acme.Thing");
        assert_eq!(rel.identifier(), "item-42");
    }

    #[test]
    fn test_uri_round_trip() {
        for id in ["1", "alice@email.com", "a#b c%d", "ü-umlaut", "trailing."] {
            let rel = Relationship::new("org.acme.Thing", id);
            let back = Relationship::from_uri(&rel.to_uri(), None).unwrap();
            assert_eq!(back, rel);
        }
    }

    #[test]
    fn test_short_form_needs_default_type() {
        let rel = Relationship::from_uri("resource:#42", Some("org.acme.Thing")).unwrap();
        assert_eq!(rel.class_fqn(), "org.acme.Thing");
        assert_eq!(rel.identifier(), "42");

        assert!(matches!(
            Relationship::from_uri("resource:#42", None),
            Err(ConcertoError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_missing_scheme_rejected() {
        assert!(matches!(
            Relationship::from_uri("org.acme.Thing#42", None),
            Err(ConcertoError::InvalidUri(_))
        ));
    }

    #[test]
    fn test_missing_fragment_rejected() {
        assert!(matches!(
            Relationship::from_uri("resource:org.acme.Thing", None),
            Err(ConcertoError::InvalidUri(_))
        ));
        assert!(matches!(
            Relationship::from_uri("resource:org.acme.Thing#", None),
            Err(ConcertoError::InvalidUri(_))
        ));
    }
}
