//! # Alinhador de Spans
//!
//! Converte anotações por caractere em sequências por token, tag a tag.
//!
//! ## Algoritmo
//! 1. Agrupa as anotações por tag (`tag -> [(start, end), ...]`).
//! 2. Para cada tag, marca um token como casado se ele couber **inteiro**
//!    dentro de algum span da tag (`token.start >= start && token.end <= end`).
//!    Sobreposição parcial não conta.
//! 3. `token_seq`: a própria tag para tokens casados, [`OUTSIDE`] para os demais.
//! 4. `char_spans`: cada sequência máxima de tokens casados consecutivos (por
//!    índice de token, não por distância no texto) vira um único span, do
//!    início do primeiro token ao fim do último.
//!
//! Um span que não contém nenhum token inteiro é descartado silenciosamente e
//! reportado como [`Diagnostic::LostAnnotation`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::diagnostics::Diagnostic;
use crate::tokenizer::Token;

/// Marcador de token fora de entidade.
pub const OUTSIDE: &str = "O";

/// Resultado do alinhamento de uma tag.
///
/// Invariante: `token_seq.len()` é igual ao número de tokens do texto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedTagRecord {
    /// Spans mesclados, em ordem de token.
    pub char_spans: Vec<(usize, usize)>,
    /// Um valor por token: a tag ou [`OUTSIDE`].
    pub token_seq: Vec<String>,
}

impl AlignedTagRecord {
    /// Tokens casados com a tag.
    pub fn matched(&self) -> impl Iterator<Item = bool> + '_ {
        self.token_seq.iter().map(|v| v != OUTSIDE)
    }
}

/// Saída de [`align`]: um registro por tag e os diagnósticos observados.
#[derive(Debug, Clone, Default)]
pub struct Alignment {
    pub records: BTreeMap<String, AlignedTagRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Agrupa as anotações por tag, preservando a ordem de entrada dentro de
/// cada tag. As tags ficam em ordem lexicográfica.
pub fn group_by_tag(annotations: &[Annotation]) -> BTreeMap<String, Vec<(usize, usize)>> {
    let mut grouped: BTreeMap<String, Vec<(usize, usize)>> = BTreeMap::new();
    for a in annotations {
        grouped.entry(a.tag.clone()).or_default().push(a.key());
    }
    grouped
}

/// Alinha as anotações aos tokens, tag a tag.
pub fn align(annotations: &[Annotation], tokens: &[Token]) -> Alignment {
    let mut alignment = Alignment::default();

    for (tag, spans) in group_by_tag(annotations) {
        let mut matched = vec![false; tokens.len()];

        for &(start, end) in &spans {
            let mut extent: Option<(usize, usize)> = None;
            for (i, token) in tokens.iter().enumerate() {
                if token.start >= start && token.end <= end {
                    matched[i] = true;
                    extent = Some(match extent {
                        Some((first, _)) => (first, token.end),
                        None => (token.start, token.end),
                    });
                }
            }

            match extent {
                None => alignment.diagnostics.push(Diagnostic::LostAnnotation {
                    start,
                    end,
                    tag: tag.clone(),
                }),
                Some(aligned) if aligned != (start, end) => {
                    alignment.diagnostics.push(Diagnostic::Snapped {
                        tag: tag.clone(),
                        original: (start, end),
                        aligned,
                    })
                }
                Some(_) => {}
            }
        }

        let token_seq = matched
            .iter()
            .map(|&m| if m { tag.clone() } else { OUTSIDE.to_string() })
            .collect();
        let char_spans = stitch_runs(&matched, tokens);

        alignment.records.insert(
            tag,
            AlignedTagRecord {
                char_spans,
                token_seq,
            },
        );
    }

    alignment
}

/// Colapsa cada sequência de tokens casados consecutivos em um span.
pub fn stitch_runs(matched: &[bool], tokens: &[Token]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut run: Option<(usize, usize)> = None;

    for (token, &m) in tokens.iter().zip(matched) {
        if m {
            run = Some(match run {
                Some((start, _)) => (start, token.end),
                None => (token.start, token.end),
            });
        } else if let Some(span) = run.take() {
            spans.push(span);
        }
    }
    if let Some(span) = run {
        spans.push(span);
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    const MURILO: &str = "Murilo is testing some components for Omdena and RebootRx.";

    fn murilo_annotations() -> Vec<Annotation> {
        vec![
            Annotation::new(0, 6, "PERSON"),
            Annotation::new(37, 44, "ORG"),
            Annotation::new(49, 58, "ORG"),
        ]
    }

    #[test]
    fn test_group_by_tag() {
        let grouped = group_by_tag(&murilo_annotations());
        let tags: Vec<&String> = grouped.keys().collect();
        assert_eq!(tags, vec!["ORG", "PERSON"]);
        assert_eq!(grouped["ORG"], vec![(37, 44), (49, 58)]);
    }

    #[test]
    fn test_align_char_spans_and_token_seq() {
        let tokens = tokenize(MURILO);
        let alignment = align(&murilo_annotations(), &tokens);

        let org = &alignment.records["ORG"];
        assert_eq!(org.char_spans, vec![(38, 44), (49, 58)]);
        assert_eq!(
            org.token_seq,
            vec!["O", "O", "O", "O", "O", "O", "ORG", "O", "ORG", "ORG"]
        );

        let person = &alignment.records["PERSON"];
        assert_eq!(person.char_spans, vec![(0, 6)]);
        assert_eq!(person.token_seq[0], "PERSON");
        assert!(person.token_seq[1..].iter().all(|v| v == OUTSIDE));
    }

    #[test]
    fn test_leading_space_is_reported_as_snapped() {
        let tokens = tokenize(MURILO);
        let alignment = align(&murilo_annotations(), &tokens);
        assert_eq!(
            alignment.diagnostics,
            vec![Diagnostic::Snapped {
                tag: "ORG".to_string(),
                original: (37, 44),
                aligned: (38, 44),
            }]
        );
    }

    #[test]
    fn test_span_inside_single_token_is_lost() {
        // "RebootRx" ocupa (49, 57); o span (49, 55) não contém nenhum token
        let tokens = tokenize(MURILO);
        let alignment = align(&[Annotation::new(49, 55, "ORG")], &tokens);

        let org = &alignment.records["ORG"];
        assert!(org.char_spans.is_empty());
        assert!(org.token_seq.iter().all(|v| v == OUTSIDE));
        assert_eq!(org.token_seq.len(), tokens.len());
        assert_eq!(
            alignment.diagnostics,
            vec![Diagnostic::LostAnnotation {
                start: 49,
                end: 55,
                tag: "ORG".to_string(),
            }]
        );
    }

    #[test]
    fn test_adjacent_spans_of_same_tag_are_stitched() {
        let tokens = tokenize("Murilo is from São Paulo, Brazil.");
        let annotations = vec![
            Annotation::new(15, 18, "CITY"),
            Annotation::new(19, 24, "CITY"),
        ];
        let alignment = align(&annotations, &tokens);
        assert_eq!(alignment.records["CITY"].char_spans, vec![(15, 24)]);
    }

    #[test]
    fn test_overlapping_spans_of_same_tag_match_once() {
        let tokens = tokenize("Murilo is from São Paulo, Brazil.");
        let annotations = vec![
            Annotation::new(15, 32, "PLACE"),
            Annotation::new(26, 32, "PLACE"),
        ];
        let alignment = align(&annotations, &tokens);
        assert_eq!(alignment.records["PLACE"].char_spans, vec![(15, 32)]);
        assert_eq!(alignment.records["PLACE"].matched().filter(|m| *m).count(), 4);
    }

    #[test]
    fn test_stitch_runs_breaks_on_unmatched() {
        let tokens = tokenize("a b c d");
        let spans = stitch_runs(&[true, false, true, true], &tokens);
        assert_eq!(spans, vec![(0, 1), (4, 7)]);
    }

    #[test]
    fn test_input_order_does_not_change_output() {
        let tokens = tokenize(MURILO);
        let mut reversed = murilo_annotations();
        reversed.reverse();
        assert_eq!(
            align(&murilo_annotations(), &tokens).records,
            align(&reversed, &tokens).records
        );
    }
}
