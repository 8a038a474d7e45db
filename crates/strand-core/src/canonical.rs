//! Canonical statement text for terms and relationships.
//!
//! The store keeps a human-readable rendering next to each term instance and
//! statement edge. Rendering is a seam: callers may plug in their own
//! [`Canonicalizer`]; [`BelCanonicalizer`] is the default.

use std::fmt::Write as _;

use crate::graph::{EntityRef, FusionRange, Graph, Relationship, Term, Variant};

/// Turns in-memory terms and relationships into canonical strings.
pub trait Canonicalizer: Send + Sync {
    fn term_to_text(&self, graph: &Graph, term: &Term) -> String;

    fn relationship_to_text(&self, graph: &Graph, relationship: &Relationship) -> String;
}

/// Renders terms in BEL-style function notation, e.g. `p(HGNC:AKT1, pmod(Ph, Ser, 473))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BelCanonicalizer;

impl Canonicalizer for BelCanonicalizer {
    fn term_to_text(&self, _graph: &Graph, term: &Term) -> String {
        render_term(term)
    }

    fn relationship_to_text(&self, graph: &Graph, relationship: &Relationship) -> String {
        let source = graph
            .term(relationship.source)
            .map_or_else(|| "?".to_string(), render_term);
        let target = graph
            .term(relationship.target)
            .map_or_else(|| "?".to_string(), render_term);
        let relation = relationship.data.relation.as_deref().unwrap_or("association");
        format!("{source} {relation} {target}")
    }
}

fn render_term(term: &Term) -> String {
    let mut args: Vec<String> = Vec::new();

    if let Some(fusion) = &term.fusion {
        args.push(format!(
            "fus({}, {}, {}, {})",
            render_ref(&fusion.partner_5p),
            render_range(&fusion.range_5p),
            render_ref(&fusion.partner_3p),
            render_range(&fusion.range_3p),
        ));
    } else if let (Some(ns), Some(name)) = (&term.namespace, &term.name) {
        args.push(format!("{ns}:{}", quote(name)));
    }

    args.extend(term.members.iter().map(render_term));
    args.extend(term.variants.iter().map(render_variant));

    format!("{}({})", term.function.short_name(), args.join(", "))
}

fn render_variant(variant: &Variant) -> String {
    match variant {
        Variant::Hgvs { identifier } => format!("var(\"{identifier}\")"),
        Variant::Fragment {
            start,
            stop,
            missing,
        } => match (start, stop) {
            (Some(start), Some(stop)) => format!("frag(\"{start}_{stop}\")"),
            _ => format!("frag(\"{}\")", missing.as_deref().unwrap_or("?")),
        },
        Variant::Gmod { identifier } => format!("gmod({})", render_short_ref(identifier)),
        Variant::Pmod {
            identifier,
            code,
            position,
        } => {
            let mut out = format!("pmod({}", render_short_ref(identifier));
            if let Some(code) = code {
                let _ = write!(out, ", {code}");
                if let Some(position) = position {
                    let _ = write!(out, ", {position}");
                }
            }
            out.push(')');
            out
        }
    }
}

fn render_range(range: &FusionRange) -> String {
    match range {
        FusionRange::Missing { missing } => format!("\"{missing}\""),
        FusionRange::Enumerated {
            reference,
            start,
            stop,
        } => format!("\"{reference}.{start}_{stop}\""),
    }
}

fn render_ref(entity: &EntityRef) -> String {
    format!("{}:{}", entity.namespace, quote(&entity.name))
}

/// Modification identifiers from the default namespace are written bare.
fn render_short_ref(entity: &EntityRef) -> String {
    if entity.namespace == "bel" {
        quote(&entity.name)
    } else {
        render_ref(entity)
    }
}

fn quote(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\\\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::Function;
    use crate::graph::{EdgeData, Fusion};

    #[test]
    fn renders_protein_modification() {
        let term = Term::named(Function::Protein, "HGNC", "AKT1").with_variants(vec![
            Variant::Pmod {
                identifier: EntityRef::new("bel", "Ph"),
                code: Some("Ser".into()),
                position: Some(473),
            },
        ]);
        assert_eq!(render_term(&term), "p(HGNC:AKT1, pmod(Ph, Ser, 473))");
    }

    #[test]
    fn quotes_names_with_punctuation() {
        let term = Term::named(Function::BiologicalProcess, "GOBP", "cell death");
        assert_eq!(render_term(&term), "bp(GOBP:\"cell death\")");
    }

    #[test]
    fn renders_complex_members_and_fusion() {
        let complex = Term::list(
            Function::Complex,
            vec![
                Term::named(Function::Protein, "HGNC", "FOS"),
                Term::named(Function::Protein, "HGNC", "JUN"),
            ],
        );
        assert_eq!(render_term(&complex), "complex(p(HGNC:FOS), p(HGNC:JUN))");

        let fusion = Term::fused(
            Function::Rna,
            Fusion {
                partner_5p: EntityRef::new("HGNC", "TMPRSS2"),
                range_5p: FusionRange::Enumerated {
                    reference: "r".into(),
                    start: "1".into(),
                    stop: "79".into(),
                },
                partner_3p: EntityRef::new("HGNC", "ERG"),
                range_3p: FusionRange::Missing {
                    missing: "?".into(),
                },
            },
        );
        assert_eq!(
            render_term(&fusion),
            "r(fus(HGNC:TMPRSS2, \"r.1_79\", HGNC:ERG, \"?\"))"
        );
    }

    #[test]
    fn renders_relationship() {
        let mut graph = Graph::new("g", "1");
        let a = graph.add_term(Term::named(Function::Protein, "HGNC", "AKT1"));
        let b = graph.add_term(Term::named(Function::Protein, "HGNC", "EGFR"));
        graph
            .add_relationship(a, b, EdgeData::relation("increases"))
            .unwrap();
        let text = BelCanonicalizer.relationship_to_text(&graph, &graph.relationships[0]);
        assert_eq!(text, "p(HGNC:AKT1) increases p(HGNC:EGFR)");
    }
}
