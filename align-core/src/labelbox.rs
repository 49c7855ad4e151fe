//! # Conversão do Export da Ferramenta de Rotulagem
//!
//! O export é uma lista JSON de linhas, cada uma com o texto (`"Labeled Data"`)
//! e os objetos rotulados (`"Label".objects`). A ferramenta grava `end`
//! **inclusivo**; o resto do crate usa `end` exclusivo. A conversão (+1 na
//! leitura, -1 na escrita) acontece somente aqui.
//!
//! Também oferece:
//! - [`trim_whitespace`]: remove espaços nas bordas dos spans.
//! - [`PredictionRecord`]: registro JSON-lines usado na avaliação.

use std::collections::BTreeSet;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, Annotations};
use crate::error::Result;
use crate::extract::LabelObject;

/// Feature que identifica o documento e não é entidade.
const PMID_FEATURE: &str = "PMID";

/// Conteúdo de `"Label"` em uma linha do export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelPayload {
    #[serde(default)]
    pub objects: Vec<LabelObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classifications: Vec<serde_json::Value>,
}

/// Uma linha do export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelboxRow {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Labeled Data")]
    pub text: String,
    #[serde(rename = "Label", default)]
    pub label: LabelPayload,
}

impl LabelboxRow {
    /// Anotações com `end` exclusivo.
    ///
    /// Ignora a feature `PMID` e spans repetidos da mesma feature. O
    /// resultado sai ordenado.
    pub fn annotations(&self) -> Annotations {
        self.label
            .objects
            .iter()
            .filter(|obj| obj.feature() != PMID_FEATURE)
            .map(|obj| {
                let loc = obj.data.location;
                Annotation::new(loc.start, loc.end + 1, obj.feature())
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Lê um export completo (lista JSON de linhas).
pub fn parse_export(raw: &str) -> Result<Vec<LabelboxRow>> {
    Ok(serde_json::from_str(raw)?)
}

/// Encolhe spans cujas bordas caem em espaço em branco.
///
/// Spans que ficam vazios, ou que saem do texto, são descartados. Ajustar
/// bordas pode criar duplicatas; o resultado sai ordenado e sem repetição.
pub fn trim_whitespace(text: &str, annotations: &[Annotation]) -> Annotations {
    let chars: Vec<char> = text.chars().collect();

    annotations
        .iter()
        .filter(|a| a.is_valid_for(chars.len()))
        .filter_map(|a| {
            let mut start = a.start;
            let mut end = a.end;
            while start < end && chars[start].is_whitespace() {
                start += 1;
            }
            while end > start && chars[end - 1].is_whitespace() {
                end -= 1;
            }
            (start < end).then(|| Annotation::new(start, end, a.tag.clone()))
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Uma predição `(start, end, entity)` com `end` exclusivo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub start: usize,
    pub end: usize,
    pub entity: String,
}

/// Registro de avaliação: um documento e suas predições.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: String,
    pub text: String,
    pub predictions: Vec<Prediction>,
}

impl PredictionRecord {
    pub fn new(id: impl Into<String>, text: impl Into<String>, annotations: &[Annotation]) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            predictions: annotations
                .iter()
                .map(|a| Prediction {
                    start: a.start,
                    end: a.end,
                    entity: a.tag.clone(),
                })
                .collect(),
        }
    }

    pub fn annotations(&self) -> Annotations {
        self.predictions
            .iter()
            .map(|p| Annotation::new(p.start, p.end, p.entity.as_str()))
            .collect()
    }

    /// Uma linha JSON (sem `\n`).
    pub fn to_jsonl_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Objetos no formato da ferramenta, com `end` inclusivo.
    pub fn to_raw_objects(&self) -> Vec<LabelObject> {
        self.predictions
            .iter()
            .filter(|p| p.end > p.start)
            .map(|p| LabelObject::new(p.entity.as_str(), p.start, p.end - 1))
            .collect()
    }
}

/// Grava os registros em JSON-lines.
pub fn write_jsonl<W: Write>(records: &[PredictionRecord], mut writer: W) -> Result<()> {
    for record in records {
        writeln!(writer, "{}", record.to_jsonl_line()?)?;
    }
    writer.flush()?;
    Ok(())
}
