//! # Diagnósticos de Alinhamento
//!
//! Eventos não fatais observados ao alinhar anotações a tokens. Eles nunca
//! interrompem o processamento; ficam guardados no
//! [`TaggedCorpus`](crate::corpus::TaggedCorpus) e também são emitidos via
//! `tracing` para quem tiver um subscriber instalado.

use serde::{Deserialize, Serialize};

/// Um evento de diagnóstico.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Anotação fora de `0 <= start < end <= len(texto)`; foi ignorada.
    InvalidSpan {
        start: usize,
        end: usize,
        tag: String,
    },
    /// Nenhum token cabe inteiro dentro do span; a anotação foi descartada.
    ///
    /// Acontece, por exemplo, quando o span cai dentro de um único token maior
    /// do que ele.
    LostAnnotation {
        start: usize,
        end: usize,
        tag: String,
    },
    /// O span casou com tokens, mas suas bordas foram ajustadas para as
    /// bordas dos tokens contidos (ex: espaço inicial removido).
    Snapped {
        tag: String,
        original: (usize, usize),
        aligned: (usize, usize),
    },
    /// Span removido pelo resolvedor de colisões na visão combinada.
    CollisionDropped {
        start: usize,
        end: usize,
        tag: String,
    },
}

impl Diagnostic {
    /// Indica perda de informação (span descartado por completo).
    pub fn is_loss(&self) -> bool {
        !matches!(self, Diagnostic::Snapped { .. })
    }

    /// Emite o diagnóstico via `tracing`.
    pub(crate) fn emit(&self) {
        match self {
            Diagnostic::InvalidSpan { start, end, tag } => {
                tracing::warn!(start, end, tag = %tag, "anotação inválida ignorada");
            }
            Diagnostic::LostAnnotation { start, end, tag } => {
                tracing::warn!(start, end, tag = %tag, "anotação sem token contido, descartada");
            }
            Diagnostic::Snapped {
                tag,
                original,
                aligned,
            } => {
                tracing::debug!(tag = %tag, ?original, ?aligned, "span ajustado às fronteiras de token");
            }
            Diagnostic::CollisionDropped { start, end, tag } => {
                tracing::warn!(start, end, tag = %tag, "span sobreposto removido, mantido o mais longo");
            }
        }
    }
}
