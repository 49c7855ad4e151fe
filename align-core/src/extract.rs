//! # Extração e Normalização de Entidades
//!
//! - [`get_entities`]: lê o JSON `{objects: [{value, data: {location}}]}` de
//!   uma linha exportada e devolve as anotações `(start, end, tag)`. Os offsets
//!   são mantidos como vieram; a conversão do `end` inclusivo da ferramenta de
//!   rotulagem fica em [`labelbox`](crate::labelbox).
//! - [`remove_group_prefix`]: remove a numeração de grupo das tags
//!   (`g2_response_rate` → `response_rate`, `group1` → `group`).

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::annotation::{Annotation, Annotations};
use crate::error::{Error, Result};

/// Posição de um objeto rotulado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectData {
    pub location: Location,
}

/// Um objeto rotulado do export: nome da entidade e localização.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelObject {
    /// Título da feature (presente nos exports completos).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub value: String,
    pub data: ObjectData,
}

impl LabelObject {
    pub fn new(feature: impl Into<String>, start: usize, end: usize) -> Self {
        let feature = feature.into();
        Self {
            title: Some(feature.clone()),
            value: feature,
            data: ObjectData {
                location: Location { start, end },
            },
        }
    }

    /// Nome da feature: `title` quando existir, senão `value`.
    pub fn feature(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.value)
    }
}

/// Lê as anotações de um JSON `{objects: [...]}`.
///
/// - Objeto vazio (`{}`) ou `null` → `Ok(None)`.
/// - `objects` vazio → `Ok(Some(vec![]))`.
/// - `objects` ausente, não-lista, ou com itens fora do formato →
///   [`Error::MalformedInput`].
pub fn get_entities(raw: &str) -> Result<Option<Annotations>> {
    let value: Value = serde_json::from_str(raw)?;
    entities_from_value(&value)
}

/// Como [`get_entities`], a partir de um JSON já parseado.
pub fn entities_from_value(value: &Value) -> Result<Option<Annotations>> {
    let map = match value {
        Value::Null => return Ok(None),
        Value::Object(map) if map.is_empty() => return Ok(None),
        Value::Object(map) => map,
        _ => return Err(Error::malformed("esperado um objeto JSON")),
    };

    let objects = map
        .get("objects")
        .ok_or_else(|| Error::malformed("lista `objects` não encontrada"))?
        .as_array()
        .ok_or_else(|| Error::malformed("`objects` não é uma lista"))?;

    objects
        .iter()
        .enumerate()
        .map(|(i, item)| {
            LabelObject::deserialize(item)
                .map(|obj| Annotation::new(obj.data.location.start, obj.data.location.end, obj.value))
                .map_err(|e| Error::malformed(format!("objects[{}]: {}", i, e)))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn group_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(g[12]_)+").expect("regex de prefixo válida"))
}

fn group_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^group[12]$").expect("regex de grupo válida"))
}

/// Remove a numeração de grupo de uma tag.
///
/// Prefixos empilhados (`g1_g2_n`) saem de uma vez, para que aplicar a
/// função de novo não mude nada.
pub fn normalize_tag(tag: &str) -> String {
    let stripped = group_prefix().replace(tag, "");
    if group_name().is_match(&stripped) {
        "group".to_string()
    } else {
        stripped.into_owned()
    }
}

/// Normaliza as tags e elimina duplicatas criadas pela normalização
/// (`g1_n` e `g2_n` no mesmo span viram um único `n`).
///
/// O resultado sai ordenado por `(start, end, tag)`.
pub fn remove_group_prefix(annotations: &[Annotation]) -> Annotations {
    annotations
        .iter()
        .map(|a| Annotation::new(a.start, a.end, normalize_tag(&a.tag)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
