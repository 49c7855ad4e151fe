//! # Anotações por Caractere
//!
//! Uma anotação é a tupla `(start, end, tag)` exportada pela ferramenta de
//! rotulagem: um intervalo semiaberto `[start, end)` de caracteres do texto e
//! o nome da entidade (ex: `PERSON`, `g1_n`).
//!
//! Os offsets são contados em caracteres (Unicode scalar values), a mesma
//! convenção usada por [`Token`](crate::tokenizer::Token).

use serde::{Deserialize, Serialize};

/// Uma anotação `(start, end, tag)`.
///
/// A ordem dos campos define a ordenação derivada: primeiro `start`, depois
/// `end`, por fim `tag`. Em JSON aceita tanto `{"start":0,"end":6,"tag":"PER"}`
/// quanto a forma compacta `[0, 6, "PER"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Annotation {
    /// Offset de caractere inicial (inclusivo).
    pub start: usize,
    /// Offset de caractere final (exclusivo).
    pub end: usize,
    /// Nome da entidade.
    pub tag: String,
}

/// Lista de anotações de um texto.
pub type Annotations = Vec<Annotation>;

impl Annotation {
    pub fn new(start: usize, end: usize, tag: impl Into<String>) -> Self {
        Self {
            start,
            end,
            tag: tag.into(),
        }
    }

    /// Número de caracteres cobertos.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chave `(start, end)` sem a tag.
    pub fn key(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Colisão entre intervalos semiabertos. Extremidades que apenas se tocam
    /// (`a.end == b.start`) não colidem.
    pub fn overlaps(&self, other: &Annotation) -> bool {
        overlaps(self.key(), other.key())
    }

    /// Verifica `0 <= start < end <= text_len`.
    pub fn is_valid_for(&self, text_len: usize) -> bool {
        self.start < self.end && self.end <= text_len
    }
}

impl<S: Into<String>> From<(usize, usize, S)> for Annotation {
    fn from((start, end, tag): (usize, usize, S)) -> Self {
        Annotation::new(start, end, tag)
    }
}

/// Colisão entre dois intervalos `[start, end)`.
pub fn overlaps(a: (usize, usize), b: (usize, usize)) -> bool {
    a.0 < b.1 && b.0 < a.1
}
