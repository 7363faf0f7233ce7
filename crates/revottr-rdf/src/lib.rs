//! RDF graph loading for revottr (boundary adapter).
//!
//! Parses RDF serializations with **Sophia** into the core's statement model:
//! - N-Triples (`.nt`)
//! - Turtle (`.ttl`)
//! - RDF/XML (`.rdf`, `.owl`, `.xml`)
//!
//! Collections stay as `rdf:first`/`rdf:rest` statements here; folding them
//! into list terms is done by fact extraction in the core.

use anyhow::{anyhow, Context, Result};
use revottr_core::graph::{FactSet, Node, Object, Statement};
use revottr_core::Literal;
use sophia::api::prelude::*;
use std::path::Path;
use tracing::debug;

pub const XSD_STRING_IRI: &str = "http://www.w3.org/2001/XMLSchema#string";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    NTriples,
    Turtle,
    RdfXml,
}

impl RdfFormat {
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "nt" | "ntriples" => Ok(RdfFormat::NTriples),
            "ttl" | "turtle" => Ok(RdfFormat::Turtle),
            "rdf" | "owl" | "xml" => Ok(RdfFormat::RdfXml),
            other => Err(anyhow!("unsupported RDF format: .{other}")),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    fn label(self) -> &'static str {
        match self {
            RdfFormat::NTriples => "N-Triples",
            RdfFormat::Turtle => "Turtle",
            RdfFormat::RdfXml => "RDF/XML",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct RdfSinkError {
    message: String,
}

impl From<anyhow::Error> for RdfSinkError {
    fn from(value: anyhow::Error) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

// ============================================================================
// Term display parsing
// ============================================================================

fn unescape_rdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Parse the N-Triples-style display form Sophia gives its terms.
fn parse_term_display(term: &str) -> Result<Object> {
    let s = term.trim();

    if let Some(rest) = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Ok(Object::Node(Node::Iri(rest.to_string())));
    }

    if let Some(rest) = s.strip_prefix("_:") {
        return Ok(Object::Node(Node::Blank(rest.to_string())));
    }

    if s.starts_with('"') {
        let mut end_quote = None;
        let mut escaped = false;
        for (i, ch) in s.char_indices().skip(1) {
            if ch == '"' && !escaped {
                end_quote = Some(i);
                break;
            }
            escaped = ch == '\\' && !escaped;
        }
        let Some(end) = end_quote else {
            return Err(anyhow!("invalid literal term (missing closing quote): {s}"));
        };

        let value = unescape_rdf_string(&s[1..end]);
        let rest = s[end + 1..].trim();

        let literal = if let Some(lang) = rest.strip_prefix('@') {
            Literal::lang(value, lang)
        } else if let Some(dt) = rest.strip_prefix("^^") {
            let dt = dt.trim();
            let dt = dt
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .unwrap_or(dt);
            if dt.is_empty() || dt == XSD_STRING_IRI {
                Literal::plain(value)
            } else {
                Literal::typed(value, dt)
            }
        } else {
            Literal::plain(value)
        };
        return Ok(Object::Literal(literal));
    }

    Err(anyhow!("unsupported RDF term form: {s}"))
}

fn parse_node_term_display(term: &str) -> Result<Node> {
    match parse_term_display(term)? {
        Object::Node(node) => Ok(node),
        Object::Literal(_) => Err(anyhow!("expected IRI/blank node, got literal: {term}")),
    }
}

fn statement_from_display(
    subject: &str,
    predicate: &str,
    object: &str,
) -> std::result::Result<Option<Statement>, RdfSinkError> {
    let subject = parse_node_term_display(subject)?;
    let Node::Iri(predicate) = parse_node_term_display(predicate)? else {
        return Ok(None);
    };
    let object = parse_term_display(object)?;
    Ok(Some(Statement::new(subject, predicate, object)))
}

// ============================================================================
// Parsing
// ============================================================================

macro_rules! collect_triples {
    ($parser:expr, $format:expr) => {{
        let mut out: Vec<Statement> = Vec::new();
        let mut parser = $parser;
        parser
            .try_for_each_triple(|t| -> std::result::Result<(), RdfSinkError> {
                let statement = statement_from_display(
                    &t.s().to_string(),
                    &t.p().to_string(),
                    &t.o().to_string(),
                )?;
                out.extend(statement);
                Ok(())
            })
            .map_err(|e| anyhow!("failed to parse {}: {e}", $format.label()))?;
        out
    }};
}

pub fn statements_from_bytes(bytes: &[u8], format: RdfFormat) -> Result<Vec<Statement>> {
    let cursor = std::io::Cursor::new(bytes);
    let reader = std::io::BufReader::new(cursor);

    let statements = match format {
        RdfFormat::NTriples => {
            collect_triples!(sophia::turtle::parser::nt::parse_bufread(reader), format)
        }
        RdfFormat::Turtle => {
            collect_triples!(sophia::turtle::parser::turtle::parse_bufread(reader), format)
        }
        RdfFormat::RdfXml => collect_triples!(sophia::xml::parser::parse_bufread(reader), format),
    };

    debug!(format = format.label(), statements = statements.len(), "parsed RDF");
    Ok(statements)
}

pub fn statements_from_file(path: &Path) -> Result<Vec<Statement>> {
    let format = RdfFormat::from_path(path)?;
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    statements_from_bytes(&bytes, format).with_context(|| format!("parsing {}", path.display()))
}

/// Load a graph file and extract its fact bindings.
pub fn facts_from_file(path: &Path) -> Result<FactSet> {
    let statements = statements_from_file(path)?;
    Ok(FactSet::from_statements(&statements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use revottr_core::graph::{RDF_FIRST, RDF_REST};
    use revottr_core::library::OBJECT;
    use revottr_core::{Term, Var};

    const SAMPLE_NT: &str = r#"
<http://example.org/alice> <http://example.org/name> "Alice"^^<http://www.w3.org/2001/XMLSchema#string> .
<http://example.org/alice> <http://example.org/knows> _:b0 .
<http://example.org/alice> <http://example.org/age> "42"^^<http://www.w3.org/2001/XMLSchema#integer> .
"#;

    #[test]
    fn parses_ntriples_and_normalizes_plain_strings() {
        let statements = statements_from_bytes(SAMPLE_NT.as_bytes(), RdfFormat::NTriples)
            .expect("statements");
        assert_eq!(statements.len(), 3);
        assert!(statements
            .iter()
            .any(|st| st.object == Object::Literal(Literal::plain("Alice"))));
        assert!(statements.iter().any(|st| st.object
            == Object::Literal(Literal::typed(
                "42",
                "http://www.w3.org/2001/XMLSchema#integer"
            ))));
        assert!(statements
            .iter()
            .any(|st| matches!(&st.object, Object::Node(Node::Blank(_)))));
    }

    #[test]
    fn turtle_collections_become_list_terms() {
        let turtle = r#"
@prefix ex: <http://example.org/> .
ex:alice ex:friends ( ex:bob ex:carol ) .
ex:alice ex:label "Alice"@en .
"#;
        let statements =
            statements_from_bytes(turtle.as_bytes(), RdfFormat::Turtle).expect("turtle");
        assert!(statements.iter().any(|st| st.predicate == RDF_FIRST));
        assert!(statements.iter().any(|st| st.predicate == RDF_REST));

        let facts = FactSet::from_statements(&statements);
        assert_eq!(facts.len(), 2);
        let friends = facts
            .triples()
            .iter()
            .find_map(|m| m.get(&Var::new(OBJECT)).and_then(Term::as_list).cloned())
            .expect("list object");
        assert_eq!(
            friends.elements(),
            &[
                Term::iri("http://example.org/bob"),
                Term::iri("http://example.org/carol")
            ]
        );
        assert!(friends.id().is_some());
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            RdfFormat::from_path(Path::new("graph.TTL")).unwrap(),
            RdfFormat::Turtle
        );
        assert_eq!(
            RdfFormat::from_path(Path::new("onto.owl")).unwrap(),
            RdfFormat::RdfXml
        );
        assert!(RdfFormat::from_path(Path::new("data.csv")).is_err());
    }

    #[test]
    fn literal_display_forms() {
        assert_eq!(
            parse_term_display(r#""a \"quoted\" word"@en"#).unwrap(),
            Object::Literal(Literal::lang("a \"quoted\" word", "en"))
        );
        assert!(parse_term_display(r#""unterminated"#).is_err());
    }
}
