//! # Corpus Anotado
//!
//! [`TaggedCorpus`] reúne um texto, sua tokenização e o alinhamento de cada
//! tag. É construído uma única vez e depois só oferece visões derivadas:
//!
//! | Visão                   | Conteúdo                                              |
//! |-------------------------|-------------------------------------------------------|
//! | `tokens`                | Texto de cada token                                   |
//! | `token_char_spans`      | `(start, end)` de cada token                          |
//! | `to_dict`               | Sequência por token de cada tag (tag ou `O`)          |
//! | `to_annotated_view`     | Entidades alinhadas a tokens (uma tag ou todas)       |
//! | `to_iob_list`           | Rótulos `B-`/`I-`/`O` por token                       |
//! | `to_multi_iob_list`     | Uma coluna IOB por tag, zipadas por token             |
//!
//! A visão combinada (sem tag) junta os spans de todas as tags e passa pelo
//! [`resolvedor de colisões`](crate::collision), porque um token só pode ter
//! uma entidade. As visões por tag nunca colidem.
//!
//! ## Exemplo
//!
//! ```rust
//! use align_core::{Annotation, TaggedCorpus};
//!
//! let corpus = TaggedCorpus::new(
//!     "Murilo is from São Paulo, Brazil.",
//!     &[Annotation::new(0, 6, "PERSON"), Annotation::new(15, 24, "CITY")],
//! );
//! let iob = corpus.to_iob_list(None).unwrap();
//! assert_eq!(iob, vec!["B-PERSON", "O", "O", "B-CITY", "I-CITY", "O", "O", "O"]);
//! ```

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::align::{align, AlignedTagRecord, OUTSIDE};
use crate::annotation::{Annotation, Annotations};
use crate::collision::resolve_with_dropped;
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::iob::IobTag;
use crate::tokenizer::{DefaultTokenizer, Token, Tokenizer};

/// Texto + tokens + alinhamento por tag. Imutável após a construção.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedCorpus {
    text: String,
    tokens: Vec<Token>,
    aligned: BTreeMap<String, AlignedTagRecord>,
    diagnostics: Vec<Diagnostic>,
}

/// Uma entidade do documento anotado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub tag: String,
    /// Offset de caractere inicial
    pub start: usize,
    /// Offset de caractere final (exclusivo)
    pub end: usize,
    /// Índice do primeiro token
    pub start_token: usize,
    /// Índice do token seguinte ao último (exclusivo)
    pub end_token: usize,
}

/// Documento com entidades já alinhadas a fronteiras de token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedDoc {
    pub tokens: Vec<Token>,
    /// Entidades sem sobreposição, em ordem de texto.
    pub entities: Vec<Entity>,
    /// Spans removidos por colisão (só na visão combinada).
    pub dropped: Vec<Annotation>,
}

impl AnnotatedDoc {
    /// Um rótulo IOB por token.
    ///
    /// Cada entidade abre com `B-` no primeiro token, mesmo quando encosta em
    /// outra entidade da mesma tag.
    pub fn iob_labels(&self) -> Vec<String> {
        let mut labels = vec![OUTSIDE.to_string(); self.tokens.len()];
        for entity in &self.entities {
            labels[entity.start_token] = IobTag::Begin(entity.tag.clone()).label();
            for label in &mut labels[entity.start_token + 1..entity.end_token] {
                *label = IobTag::Inside(entity.tag.clone()).label();
            }
        }
        labels
    }

    /// Texto coberto por cada entidade, reconstruído a partir dos tokens.
    pub fn entity_texts(&self, text: &str) -> Vec<(String, &str)> {
        self.entities
            .iter()
            .map(|e| {
                let slice: String = text.chars().skip(e.start).take(e.end - e.start).collect();
                (slice, e.tag.as_str())
            })
            .collect()
    }
}

impl TaggedCorpus {
    /// Constrói o corpus com o [`DefaultTokenizer`].
    pub fn new(text: impl Into<String>, annotations: &[Annotation]) -> Self {
        Self::with_tokenizer(text, annotations, &DefaultTokenizer::default())
    }

    /// Constrói o corpus com um tokenizador qualquer.
    ///
    /// Anotações fora de `0 <= start < end <= len(texto)` são ignoradas e
    /// registradas como [`Diagnostic::InvalidSpan`].
    pub fn with_tokenizer<T>(text: impl Into<String>, annotations: &[Annotation], tokenizer: &T) -> Self
    where
        T: Tokenizer + ?Sized,
    {
        let text = text.into();
        let tokens = tokenizer.tokenize(&text);
        let text_len = text.chars().count();

        let mut diagnostics = Vec::new();
        let valid: Vec<Annotation> = annotations
            .iter()
            .filter(|a| {
                let ok = a.is_valid_for(text_len);
                if !ok {
                    diagnostics.push(Diagnostic::InvalidSpan {
                        start: a.start,
                        end: a.end,
                        tag: a.tag.clone(),
                    });
                }
                ok
            })
            .cloned()
            .collect();

        let alignment = align(&valid, &tokens);
        diagnostics.extend(alignment.diagnostics);
        for d in &diagnostics {
            d.emit();
        }

        tracing::debug!(
            tokens = tokens.len(),
            tags = alignment.records.len(),
            diagnostics = diagnostics.len(),
            "corpus alinhado"
        );

        Self {
            text,
            tokens,
            aligned: alignment.records,
            diagnostics,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Texto de cada token, em ordem.
    pub fn tokens(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// Tokens completos, com offsets e índices.
    pub fn tokens_with_offsets(&self) -> &[Token] {
        &self.tokens
    }

    /// `(start, end)` de cada token, paralelo a [`tokens`](Self::tokens).
    pub fn token_char_spans(&self) -> Vec<(usize, usize)> {
        self.tokens.iter().map(Token::span).collect()
    }

    /// Tags presentes, em ordem lexicográfica.
    pub fn tags(&self) -> Vec<&str> {
        self.aligned.keys().map(String::as_str).collect()
    }

    /// Registro alinhado de cada tag.
    pub fn aligned(&self) -> &BTreeMap<String, AlignedTagRecord> {
        &self.aligned
    }

    /// Spans mesclados de uma tag.
    pub fn char_spans(&self, tag: &str) -> Option<&[(usize, usize)]> {
        self.aligned.get(tag).map(|r| r.char_spans.as_slice())
    }

    /// Diagnósticos produzidos na construção.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Sequência por token de cada tag: o nome da tag ou `O` (sem prefixo IOB).
    pub fn to_dict(&self) -> BTreeMap<String, Vec<String>> {
        self.aligned
            .iter()
            .map(|(tag, record)| (tag.clone(), record.token_seq.clone()))
            .collect()
    }

    /// Documento anotado com uma tag (`Some`) ou com todas (`None`).
    ///
    /// Na visão combinada os spans de todas as tags passam pelo resolvedor de
    /// colisões; o que cair vai para [`AnnotatedDoc::dropped`].
    ///
    /// # Erros
    /// - [`Error::UnknownTag`] se a tag não existir no corpus.
    /// - [`Error::TokenBoundaryViolation`] se algum span não coincidir com
    ///   fronteiras de token, o que só acontece com um tokenizador que viola
    ///   o contrato de [`Tokenizer`].
    pub fn to_annotated_view(&self, tag: Option<&str>) -> Result<AnnotatedDoc> {
        let (spans, dropped) = match tag {
            Some(tag) => {
                let record = self
                    .aligned
                    .get(tag)
                    .ok_or_else(|| Error::UnknownTag(tag.to_string()))?;
                let spans = record
                    .char_spans
                    .iter()
                    .map(|&(start, end)| Annotation::new(start, end, tag))
                    .collect();
                (spans, Vec::new())
            }
            None => {
                let resolution = resolve_with_dropped(&self.flattened_spans());
                for span in &resolution.dropped {
                    Diagnostic::CollisionDropped {
                        start: span.start,
                        end: span.end,
                        tag: span.tag.clone(),
                    }
                    .emit();
                }
                (resolution.kept, resolution.dropped)
            }
        };

        let mut entities = Vec::with_capacity(spans.len());
        for span in spans {
            entities.push(self.entity_for(span)?);
        }
        entities.sort_by_key(|e| (e.start, e.end));

        Ok(AnnotatedDoc {
            tokens: self.tokens.clone(),
            entities,
            dropped,
        })
    }

    /// Rótulos IOB por token, a partir de [`to_annotated_view`](Self::to_annotated_view).
    pub fn to_iob_list(&self, tag: Option<&str>) -> Result<Vec<String>> {
        Ok(self.to_annotated_view(tag)?.iob_labels())
    }

    /// Uma sequência IOB por tag, calculadas de forma independente e zipadas
    /// por token. Devolve também a ordem das tags em cada tupla.
    ///
    /// Sem tags no corpus, o resultado é vazio.
    pub fn to_multi_iob_list(&self) -> Result<(Vec<Vec<String>>, Vec<String>)> {
        let tag_order: Vec<String> = self.aligned.keys().cloned().collect();
        let columns = tag_order
            .iter()
            .map(|tag| self.to_iob_list(Some(tag)))
            .collect::<Result<Vec<_>>>()?;

        if columns.is_empty() {
            return Ok((Vec::new(), tag_order));
        }

        let rows = (0..self.tokens.len())
            .map(|i| columns.iter().map(|col| col[i].clone()).collect())
            .collect();
        Ok((rows, tag_order))
    }

    /// Todos os spans alinhados como lista plana, tag a tag.
    fn flattened_spans(&self) -> Vec<Annotation> {
        self.aligned
            .iter()
            .flat_map(|(tag, record)| {
                record
                    .char_spans
                    .iter()
                    .map(move |&(start, end)| Annotation::new(start, end, tag.as_str()))
            })
            .collect()
    }

    /// Localiza os tokens de borda de um span; falha se não coincidirem.
    fn entity_for(&self, span: Annotation) -> Result<Entity> {
        let start_token = self.tokens.iter().position(|t| t.start == span.start);
        let last_token = self.tokens.iter().position(|t| t.end == span.end);

        match (start_token, last_token) {
            (Some(first), Some(last)) if first <= last && span.start < span.end => Ok(Entity {
                tag: span.tag,
                start: span.start,
                end: span.end,
                start_token: first,
                end_token: last + 1,
            }),
            _ => Err(Error::TokenBoundaryViolation {
                start: span.start,
                end: span.end,
                tag: span.tag,
            }),
        }
    }
}

/// Constrói um corpus por texto, em paralelo.
///
/// # Erros
/// [`Error::LengthMismatch`] se `texts` e `annotations` tiverem tamanhos diferentes.
pub fn build_batch<S, T>(texts: &[S], annotations: &[Annotations], tokenizer: &T) -> Result<Vec<TaggedCorpus>>
where
    S: AsRef<str> + Sync,
    T: Tokenizer + Sync + ?Sized,
{
    if texts.len() != annotations.len() {
        return Err(Error::LengthMismatch {
            texts: texts.len(),
            annotations: annotations.len(),
        });
    }

    Ok(texts
        .par_iter()
        .zip(annotations.par_iter())
        .map(|(text, anns)| TaggedCorpus::with_tokenizer(text.as_ref(), anns, tokenizer))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iob::is_well_formed;

    const MURILO: &str = "Murilo is testing some components for Omdena and RebootRx.";
    const SAO_PAULO: &str = "Murilo is from São Paulo, Brazil.";

    fn murilo_corpus() -> TaggedCorpus {
        TaggedCorpus::new(
            MURILO,
            &[
                Annotation::new(0, 6, "PERSON"),
                Annotation::new(37, 44, "ORG"),
                Annotation::new(49, 58, "ORG"),
            ],
        )
    }

    fn places_corpus() -> TaggedCorpus {
        TaggedCorpus::new(
            SAO_PAULO,
            &[
                Annotation::new(0, 6, "PERSON"),
                Annotation::new(15, 24, "CITY"),
                Annotation::new(26, 32, "COUNTRY"),
                Annotation::new(15, 32, "PLACE"),
            ],
        )
    }

    #[test]
    fn test_token_char_spans() {
        let corpus = TaggedCorpus::new("This is a test text.", &[]);
        assert_eq!(
            corpus.token_char_spans(),
            vec![(0, 4), (5, 7), (8, 9), (10, 14), (15, 19), (19, 20)]
        );
        assert_eq!(corpus.tokens(), vec!["This", "is", "a", "test", "text", "."]);
        assert!(corpus.to_dict().is_empty());
    }

    #[test]
    fn test_aligned_char_spans() {
        let corpus = murilo_corpus();
        assert_eq!(corpus.char_spans("ORG"), Some(&[(38, 44), (49, 58)][..]));
        assert_eq!(corpus.char_spans("PERSON"), Some(&[(0, 6)][..]));
        assert_eq!(corpus.char_spans("PLACE"), None);
    }

    #[test]
    fn test_to_dict() {
        let dict = murilo_corpus().to_dict();
        assert_eq!(
            dict["ORG"],
            vec!["O", "O", "O", "O", "O", "O", "ORG", "O", "ORG", "ORG"]
        );
        assert_eq!(
            dict["PERSON"],
            vec!["PERSON", "O", "O", "O", "O", "O", "O", "O", "O", "O"]
        );
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_annotated_view_entities() {
        let corpus = murilo_corpus();
        let doc = corpus.to_annotated_view(None).unwrap();
        assert!(doc.dropped.is_empty());
        assert_eq!(
            doc.entity_texts(corpus.text()),
            vec![
                ("Murilo".to_string(), "PERSON"),
                ("Omdena".to_string(), "ORG"),
                ("RebootRx.".to_string(), "ORG"),
            ]
        );
        assert_eq!(doc.entities[2].start_token, 8);
        assert_eq!(doc.entities[2].end_token, 10);
    }

    #[test]
    fn test_to_iob_list() {
        let corpus = TaggedCorpus::new(
            "Murilo is from São Paulo, a city in Brazil.",
            &[
                Annotation::new(0, 6, "PERSON"),
                Annotation::new(15, 24, "PLACE"),
                Annotation::new(35, 43, "PLACE"),
            ],
        );
        assert_eq!(
            corpus.to_iob_list(None).unwrap(),
            vec![
                "B-PERSON", "O", "O", "B-PLACE", "I-PLACE", "O", "O", "O", "O", "B-PLACE",
                "I-PLACE",
            ]
        );
    }

    #[test]
    fn test_to_multi_iob_list() {
        let (rows, tags) = places_corpus().to_multi_iob_list().unwrap();
        assert_eq!(tags, vec!["CITY", "COUNTRY", "PERSON", "PLACE"]);
        let expected: Vec<Vec<&str>> = vec![
            vec!["O", "O", "B-PERSON", "O"],
            vec!["O", "O", "O", "O"],
            vec!["O", "O", "O", "O"],
            vec!["B-CITY", "O", "O", "B-PLACE"],
            vec!["I-CITY", "O", "O", "I-PLACE"],
            vec!["O", "O", "O", "I-PLACE"],
            vec!["O", "B-COUNTRY", "O", "I-PLACE"],
            vec!["O", "O", "O", "O"],
        ];
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_combined_view_keeps_longest_span() {
        let corpus = places_corpus();
        let doc = corpus.to_annotated_view(None).unwrap();
        assert_eq!(
            doc.dropped,
            vec![
                Annotation::new(15, 24, "CITY"),
                Annotation::new(26, 32, "COUNTRY"),
            ]
        );
        assert_eq!(
            doc.iob_labels(),
            vec!["B-PERSON", "O", "O", "B-PLACE", "I-PLACE", "I-PLACE", "I-PLACE", "O"]
        );
    }

    #[test]
    fn test_single_tag_view_ignores_other_tags() {
        let corpus = places_corpus();
        assert_eq!(
            corpus.to_iob_list(Some("CITY")).unwrap(),
            vec!["O", "O", "O", "B-CITY", "I-CITY", "O", "O", "O"]
        );
    }

    #[test]
    fn test_unknown_tag() {
        let err = murilo_corpus().to_iob_list(Some("PLACE")).unwrap_err();
        assert!(matches!(err, Error::UnknownTag(tag) if tag == "PLACE"));
    }

    #[test]
    fn test_multi_iob_without_tags_is_empty() {
        let corpus = TaggedCorpus::new("No entities here.", &[]);
        let (rows, tags) = corpus.to_multi_iob_list().unwrap();
        assert!(rows.is_empty());
        assert!(tags.is_empty());
        assert_eq!(corpus.to_iob_list(None).unwrap(), vec!["O"; 4]);
    }

    #[test]
    fn test_invalid_and_lost_annotations_are_diagnosed() {
        let corpus = TaggedCorpus::new(
            MURILO,
            &[
                Annotation::new(0, 6, "PERSON"),
                Annotation::new(49, 55, "ORG"),
                Annotation::new(50, 500, "ORG"),
                Annotation::new(7, 7, "X"),
            ],
        );
        assert_eq!(
            corpus.diagnostics(),
            &[
                Diagnostic::InvalidSpan { start: 50, end: 500, tag: "ORG".into() },
                Diagnostic::InvalidSpan { start: 7, end: 7, tag: "X".into() },
                Diagnostic::LostAnnotation { start: 49, end: 55, tag: "ORG".into() },
            ]
        );
        assert_eq!(corpus.tags(), vec!["ORG", "PERSON"]);
        assert!(corpus.char_spans("ORG").unwrap().is_empty());
    }

    #[test]
    fn test_tokenizer_breaking_contract_is_a_boundary_violation() {
        // Tokens fora de ordem geram um span invertido
        let backwards = |_: &str| vec![Token::new("d", 3, 4), Token::new("a", 0, 1)];
        let corpus = TaggedCorpus::with_tokenizer("a bd", &[Annotation::new(0, 4, "X")], &backwards);
        assert_eq!(corpus.char_spans("X"), Some(&[(3, 1)][..]));
        assert!(matches!(
            corpus.to_annotated_view(Some("X")),
            Err(Error::TokenBoundaryViolation { start: 3, end: 1, .. })
        ));
    }

    #[test]
    fn test_build_batch() {
        let texts = ["Mr. Bean flew to New York.", "Murilo is da bomb from Brazil."];
        let annotations = vec![
            vec![Annotation::new(0, 8, "PERSON"), Annotation::new(17, 25, "PLACE")],
            vec![Annotation::new(0, 6, "PERSON"), Annotation::new(23, 29, "PLACE")],
        ];
        let corpora = build_batch(&texts, &annotations, &DefaultTokenizer::default()).unwrap();
        assert_eq!(corpora.len(), 2);
        assert_eq!(
            corpora[0].to_iob_list(None).unwrap(),
            vec!["B-PERSON", "I-PERSON", "O", "O", "B-PLACE", "I-PLACE", "O"]
        );
        assert_eq!(
            corpora[1].to_iob_list(None).unwrap(),
            vec!["B-PERSON", "O", "O", "O", "O", "B-PLACE", "O"]
        );
    }

    #[test]
    fn test_build_batch_length_mismatch() {
        let err = build_batch(&["a"], &[], &DefaultTokenizer::default()).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { texts: 1, annotations: 0 }));
    }

    #[test]
    fn test_iob_outputs_are_well_formed() {
        let corpus = places_corpus();
        assert!(is_well_formed(&corpus.to_iob_list(None).unwrap()));
        for tag in corpus.tags() {
            assert!(is_well_formed(&corpus.to_iob_list(Some(tag)).unwrap()));
        }
    }
}
