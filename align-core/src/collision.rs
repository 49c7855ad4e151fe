//! # Resolvedor de Colisões
//!
//! Um token só pode pertencer a uma entidade na visão combinada de todas as
//! tags. Quando spans de tags diferentes se sobrepõem, fica o mais longo.
//!
//! ## Política
//! - Dois spans colidem se `a.start < b.end && b.start < a.end`; spans que só
//!   se tocam não colidem.
//! - Spans com o mesmo `(start, end)` e tags diferentes: vale a tag que
//!   aparece primeiro na entrada.
//! - Na colisão, cai o span mais curto. Com comprimentos iguais, fica o de
//!   menor `(start, end)`.
//! - Cada rodada compara todos os pares restantes e remove todos os perdedores
//!   de uma vez. Repete até uma rodada não remover nada, o que cobre colisões
//!   em cadeia ou entre três spans.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::annotation::{overlaps, Annotation};

/// Spans mantidos e spans descartados por uma resolução.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Spans sem colisão, ordenados por `(start, end)`.
    pub kept: Vec<Annotation>,
    /// Spans descartados (por duplicidade de chave ou colisão), ordenados.
    pub dropped: Vec<Annotation>,
}

/// Remove spans sobrepostos mantendo os mais longos.
pub fn resolve(spans: &[Annotation]) -> Vec<Annotation> {
    resolve_with_dropped(spans).kept
}

/// Como [`resolve`], mas também devolve o que foi descartado.
pub fn resolve_with_dropped(spans: &[Annotation]) -> Resolution {
    // Percorre de trás para frente: a primeira ocorrência de cada chave
    // sobrescreve as posteriores.
    let mut by_key: BTreeMap<(usize, usize), &str> = BTreeMap::new();
    for span in spans.iter().rev() {
        by_key.insert(span.key(), span.tag.as_str());
    }

    let mut dropped: Vec<Annotation> = spans
        .iter()
        .filter(|s| by_key.get(&s.key()).is_some_and(|tag| *tag != s.tag))
        .cloned()
        .collect();

    let mut candidates: Vec<(usize, usize)> = by_key.keys().copied().collect();
    loop {
        let losers = collision_losers(&candidates);
        if losers.is_empty() {
            break;
        }
        candidates.retain(|key| !losers.contains(key));
        dropped.extend(losers.iter().map(|key| Annotation::new(key.0, key.1, by_key[key])));
    }

    dropped.sort();
    let kept = candidates
        .into_iter()
        .map(|key| Annotation::new(key.0, key.1, by_key[&key]))
        .collect();

    Resolution { kept, dropped }
}

/// Perdedores de todas as colisões entre pares de `candidates` (ordenados).
fn collision_losers(candidates: &[(usize, usize)]) -> BTreeSet<(usize, usize)> {
    let mut losers = BTreeSet::new();
    for (i, &a) in candidates.iter().enumerate() {
        for &b in &candidates[i + 1..] {
            if overlaps(a, b) {
                losers.insert(loser(a, b));
            }
        }
    }
    losers
}

/// O span que cai numa colisão: o mais curto, ou o de maior `(start, end)`.
fn loser(a: (usize, usize), b: (usize, usize)) -> (usize, usize) {
    let len_a = a.1 - a.0;
    let len_b = b.1 - b.0;
    match len_a.cmp(&len_b) {
        std::cmp::Ordering::Less => a,
        std::cmp::Ordering::Greater => b,
        std::cmp::Ordering::Equal => a.max(b),
    }
}

/// Verifica se algum par de spans colide.
pub fn has_collisions(spans: &[Annotation]) -> bool {
    spans
        .iter()
        .enumerate()
        .any(|(i, a)| spans[i + 1..].iter().any(|b| a.overlaps(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(v: &[(usize, usize, &str)]) -> Vec<Annotation> {
        v.iter().map(|&(s, e, t)| Annotation::new(s, e, t)).collect()
    }

    #[test]
    fn test_shorter_nested_span_is_dropped() {
        let input = ann(&[(2, 6, "TAG1"), (6, 8, "TAG2"), (9, 12, "TAG3"), (9, 10, "TAG4")]);
        let resolution = resolve_with_dropped(&input);
        assert_eq!(
            resolution.kept,
            ann(&[(2, 6, "TAG1"), (6, 8, "TAG2"), (9, 12, "TAG3")])
        );
        assert_eq!(resolution.dropped, ann(&[(9, 10, "TAG4")]));
    }

    #[test]
    fn test_duplicate_key_keeps_first_tag() {
        let input = ann(&[(0, 5, "A"), (0, 5, "B"), (0, 5, "C")]);
        let resolution = resolve_with_dropped(&input);
        assert_eq!(resolution.kept, ann(&[(0, 5, "A")]));
        assert_eq!(resolution.dropped, ann(&[(0, 5, "B"), (0, 5, "C")]));
    }

    #[test]
    fn test_equal_length_keeps_earlier_span() {
        let input = ann(&[(4, 8, "LATE"), (2, 6, "EARLY")]);
        assert_eq!(resolve(&input), ann(&[(2, 6, "EARLY")]));
    }

    #[test]
    fn test_chain_of_collisions() {
        // (3, 9) vence (0, 4) e (8, 10) na mesma rodada
        let input = ann(&[(0, 4, "A"), (3, 9, "B"), (8, 10, "C")]);
        assert_eq!(resolve(&input), ann(&[(3, 9, "B")]));
    }

    #[test]
    fn test_losers_of_a_wave_are_dropped_together() {
        // (0, 10) perde para (5, 20), que por sua vez perde para (12, 40)
        let input = ann(&[(0, 10, "A"), (5, 20, "B"), (15, 30, "C"), (12, 40, "D")]);
        let resolution = resolve_with_dropped(&input);
        assert_eq!(resolution.kept, ann(&[(12, 40, "D")]));
        assert_eq!(
            resolution.dropped,
            ann(&[(0, 10, "A"), (5, 20, "B"), (15, 30, "C")])
        );
        assert!(!has_collisions(&resolution.kept));
    }

    #[test]
    fn test_touching_spans_survive() {
        let input = ann(&[(0, 3, "A"), (3, 6, "B"), (6, 9, "C")]);
        assert_eq!(resolve(&input), input);
    }

    #[test]
    fn test_empty_input() {
        assert!(resolve(&[]).is_empty());
    }

    #[test]
    fn test_resolution_is_a_fixed_point() {
        let input = ann(&[(0, 4, "A"), (3, 9, "B"), (8, 10, "C"), (20, 25, "D"), (21, 22, "E")]);
        let once = resolve(&input);
        assert_eq!(resolve(&once), once);
    }
}
