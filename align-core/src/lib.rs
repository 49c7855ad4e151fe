//! # align-core: Alinhamento de Anotações de Entidades a Tokens
//!
//! Ferramentas de rotulagem exportam entidades como intervalos de caracteres
//! (`start`, `end`, `tag`). Modelos de sequência precisam de um rótulo por
//! token. Este crate faz a ponte entre as duas representações.
//!
//! ## Fluxo
//!
//! 1.  **Entrada**: texto bruto e anotações por caractere ([`annotation`]),
//!     lidas do JSON exportado ([`extract`], [`labelbox`]).
//! 2.  **Tokenização** ([`tokenizer`]): o texto vira tokens com offsets em
//!     caracteres.
//! 3.  **Alinhamento** ([`align`]): cada tag vira uma sequência por token e
//!     uma lista de spans ajustados às fronteiras dos tokens.
//! 4.  **Visões** ([`corpus`]): sequências por tag, entidades alinhadas, IOB
//!     simples e IOB multi-coluna.
//! 5.  **Colisões** ([`collision`]): na visão combinada, spans sobrepostos de
//!     tags diferentes são resolvidos mantendo o mais longo.
//!
//! Anotações perdidas ou ajustadas viram [`Diagnostic`]s em vez de erros.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use align_core::{Annotation, TaggedCorpus};
//!
//! let text = "Murilo Bento is from São Paulo, Brazil.";
//! let corpus = TaggedCorpus::new(
//!     text,
//!     &[
//!         Annotation::new(0, 12, "PERSON"),
//!         Annotation::new(21, 30, "CITY"),
//!         Annotation::new(32, 38, "COUNTRY"),
//!     ],
//! );
//!
//! assert_eq!(corpus.tags(), vec!["CITY", "COUNTRY", "PERSON"]);
//! let iob = corpus.to_iob_list(Some("CITY")).unwrap();
//! assert_eq!(iob[4..6], ["B-CITY", "I-CITY"]);
//! ```

pub mod align;
pub mod annotation;
pub mod collision;
pub mod corpus;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod iob;
pub mod labelbox;
pub mod tokenizer;

pub use align::{AlignedTagRecord, OUTSIDE};
pub use annotation::{Annotation, Annotations};
pub use collision::resolve;
pub use corpus::{build_batch, AnnotatedDoc, Entity, TaggedCorpus};
pub use diagnostics::Diagnostic;
pub use error::{Error, Result};
pub use extract::{get_entities, remove_group_prefix};
pub use iob::IobTag;
pub use labelbox::{LabelboxRow, PredictionRecord};
pub use tokenizer::{DefaultTokenizer, Token, Tokenizer, TokenizerConfig};
