//! # Esquema IOB
//!
//! Rotulagem por token usada para treinar e avaliar modelos de sequência.
//!
//! - `B-TAG`: Begin, primeiro token de uma entidade
//! - `I-TAG`: Inside, tokens seguintes da mesma entidade
//! - `O`: Outside, fora de qualquer entidade
//!
//! As tags são livres (ex: `PERSON`, `g1_n`), por isso ficam como `String`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::align::OUTSIDE;

/// Tag IOB aplicada a um token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IobTag {
    /// Marca o INÍCIO de uma entidade. Ex: **São** (B-CITY) Paulo.
    Begin(String),
    /// Marca a CONTINUAÇÃO de uma entidade. Ex: São **Paulo** (I-CITY).
    Inside(String),
    /// O token não faz parte de nenhuma entidade.
    Outside,
}

impl IobTag {
    /// Representação textual da tag (ex: "B-PERSON", "I-ORG", "O")
    pub fn label(&self) -> String {
        match self {
            IobTag::Begin(tag) => format!("B-{}", tag),
            IobTag::Inside(tag) => format!("I-{}", tag),
            IobTag::Outside => OUTSIDE.to_string(),
        }
    }

    /// Nome da entidade (se for B- ou I-)
    pub fn entity(&self) -> Option<&str> {
        match self {
            IobTag::Begin(tag) | IobTag::Inside(tag) => Some(tag),
            IobTag::Outside => None,
        }
    }

    /// Parseia uma tag a partir de string (ex: "B-PER" → Begin("PER")).
    ///
    /// Só o primeiro `-` separa prefixo e entidade, então `B-g1-n` vira
    /// `Begin("g1-n")`.
    pub fn from_label(s: &str) -> Option<Self> {
        if s == OUTSIDE {
            return Some(IobTag::Outside);
        }
        let (prefix, tag) = s.split_once('-')?;
        if tag.is_empty() {
            return None;
        }
        match prefix {
            "B" => Some(IobTag::Begin(tag.to_string())),
            "I" => Some(IobTag::Inside(tag.to_string())),
            _ => None,
        }
    }

    /// Verifica se a transição `prev → next` é válida.
    ///
    /// - `I-X` só pode seguir `B-X` ou `I-X`
    /// - `B-X` e `O` podem seguir qualquer tag
    pub fn is_valid_transition(prev: &IobTag, next: &IobTag) -> bool {
        match next {
            IobTag::Inside(tag) => match prev {
                IobTag::Begin(prev_tag) | IobTag::Inside(prev_tag) => prev_tag == tag,
                IobTag::Outside => false,
            },
            _ => true,
        }
    }
}

impl fmt::Display for IobTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Entidade em índices de token: `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
    pub tag: String,
}

/// Verifica se uma sequência de rótulos é IOB bem formada.
///
/// `I-X` precisa vir depois de `B-X`/`I-X`, exceto na posição 0. Rótulos que
/// não parseiam tornam a sequência malformada.
pub fn is_well_formed<S: AsRef<str>>(labels: &[S]) -> bool {
    let mut prev: Option<IobTag> = None;
    for label in labels {
        let Some(tag) = IobTag::from_label(label.as_ref()) else {
            return false;
        };
        if let Some(prev) = &prev {
            if !IobTag::is_valid_transition(prev, &tag) {
                return false;
            }
        }
        prev = Some(tag);
    }
    true
}

/// Converte rótulos IOB em entidades por índice de token.
///
/// Tolerante a sequências malformadas: um `I-X` sem `B-X` antes abre uma
/// nova entidade, e rótulos desconhecidos contam como `O`.
pub fn decode_spans<S: AsRef<str>>(labels: &[S]) -> Vec<TokenSpan> {
    let mut spans = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (i, label) in labels.iter().enumerate() {
        match IobTag::from_label(label.as_ref()) {
            Some(IobTag::Begin(tag)) => {
                if let Some((start, prev)) = current.take() {
                    spans.push(TokenSpan { start, end: i, tag: prev });
                }
                current = Some((i, tag));
            }
            Some(IobTag::Inside(tag)) => {
                let continues = matches!(&current, Some((_, prev)) if *prev == tag);
                if !continues {
                    if let Some((start, prev)) = current.take() {
                        spans.push(TokenSpan { start, end: i, tag: prev });
                    }
                    current = Some((i, tag));
                }
            }
            Some(IobTag::Outside) | None => {
                if let Some((start, prev)) = current.take() {
                    spans.push(TokenSpan { start, end: i, tag: prev });
                }
            }
        }
    }

    if let Some((start, tag)) = current {
        spans.push(TokenSpan {
            start,
            end: labels.len(),
            tag,
        });
    }

    spans
}
