//! Tipos de erro do `align-core`.

use thiserror::Error;

/// Resultado padrão das operações do crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Erros que interrompem uma operação.
///
/// Anotações perdidas ou ajustadas não são erros: elas aparecem como
/// [`Diagnostic`](crate::diagnostics::Diagnostic) e o processamento continua.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// O JSON de exportação não tem o formato `{objects: [...]}` esperado.
    #[error("Entrada malformada: {0}")]
    MalformedInput(String),

    /// O texto recebido não é JSON válido.
    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),

    /// Erro de IO ao gravar registros.
    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    /// Uma entidade do documento anotado não coincide com fronteiras de token.
    ///
    /// Indica defeito no alinhador, não entrada ruim.
    #[error("Span ({start}, {end}, {tag}) não coincide com fronteiras de token")]
    TokenBoundaryViolation {
        start: usize,
        end: usize,
        tag: String,
    },

    /// Visão por tag pedida para uma tag que o corpus não contém.
    #[error("Tag desconhecida: {0}")]
    UnknownTag(String),

    /// Lote com quantidades diferentes de textos e listas de anotações.
    #[error("Tamanhos não conferem: {texts} textos e {annotations} listas de anotações")]
    LengthMismatch { texts: usize, annotations: usize },
}

impl Error {
    /// Atalho para [`Error::MalformedInput`].
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedInput(msg.into())
    }
}
