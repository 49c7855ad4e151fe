//! # Tokenizador
//!
//! Divide o texto em tokens preservando a posição original de cada um, para
//! que anotações por caractere possam ser comparadas com as fronteiras dos
//! tokens.
//!
//! O alinhamento não depende de um tokenizador específico: qualquer tipo que
//! implemente [`Tokenizer`] (inclusive uma closure `Fn(&str) -> Vec<Token>`)
//! pode ser usado. O [`DefaultTokenizer`] segue estas regras:
//!
//! 1. Segmentação por fronteiras de palavra Unicode (UAX #29).
//! 2. Espaços em branco separam tokens e nunca viram tokens.
//! 3. Cada caractere de `infix_chars` (por padrão `- / = ) ( > <`) vira um
//!    token próprio, mesmo no meio de um segmento.
//! 4. Abreviações conhecidas mantêm o ponto final (`Mr.`).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use align_core::tokenizer::{tokenize, Tokenizer, DefaultTokenizer};
//!
//! let tokens = tokenize("token-test");
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, vec!["token", "-", "test"]);
//!
//! // Offsets em caracteres, fim exclusivo
//! let tokens = DefaultTokenizer::default().tokenize("São Paulo");
//! assert_eq!((tokens[1].start, tokens[1].end), (4, 9));
//! ```

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Um token extraído do texto original.
///
/// `start` e `end` são offsets de **caractere** (não de byte), com `end`
/// exclusivo. É a mesma convenção das anotações exportadas pela ferramenta de
/// rotulagem, então `"São"` ocupa `(15, 18)` em `"Murilo is from São Paulo"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// O texto do token (ex: "Murilo", ",", "=").
    pub text: String,
    /// Offset de caractere inicial (inclusivo).
    pub start: usize,
    /// Offset de caractere final (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            index: 0,
        }
    }

    /// Par `(start, end)` do token.
    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

/// Capacidade de tokenização usada pelo alinhador.
///
/// Deve ser determinística para um mesmo texto e devolver tokens em ordem,
/// sem sobreposição, com `end > start`.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<Token>,
{
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = self(text);
        reindex(&mut tokens);
        tokens
    }
}

/// Caracteres que sempre viram tokens próprios.
const INFIX_CHARS: &[char] = &['-', '/', '=', ')', '(', '>', '<'];

/// Abreviações em inglês cujo ponto final pertence ao token.
const ABBREVIATIONS: &[&str] = &[
    "Mr", "Mrs", "Ms", "Dr", "Prof", "vs", "etc", "al", "Fig", "approx", "No",
];

/// Configuração do [`DefaultTokenizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Caracteres separados como tokens próprios.
    pub infix_chars: Vec<char>,
    /// Palavras que mantêm o `.` seguinte no mesmo token.
    pub abbreviations: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            infix_chars: INFIX_CHARS.to_vec(),
            abbreviations: ABBREVIATIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Tokenizador padrão de palavras e pontuação.
#[derive(Debug, Clone, Default)]
pub struct DefaultTokenizer {
    config: TokenizerConfig,
}

impl DefaultTokenizer {
    pub fn with_config(config: TokenizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Quebra um segmento UAX #29 em espaços e infixos.
    fn split_segment(&self, segment: &str, char_offset: usize, tokens: &mut Vec<Token>) {
        let mut current_text = String::new();
        let mut current_start = char_offset;

        for (i, ch) in segment.chars().enumerate() {
            let pos = char_offset + i;
            if ch.is_whitespace() {
                flush_token(tokens, &mut current_text, current_start, pos);
            } else if self.config.infix_chars.contains(&ch) {
                flush_token(tokens, &mut current_text, current_start, pos);
                tokens.push(Token::new(ch.to_string(), pos, pos + 1));
            } else {
                if current_text.is_empty() {
                    current_start = pos;
                }
                current_text.push(ch);
            }
        }

        let end = char_offset + segment.chars().count();
        flush_token(tokens, &mut current_text, current_start, end);
    }

    /// Junta `Mr` + `.` quando forem adjacentes.
    fn join_abbreviations(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
        for token in tokens {
            if token.text == "." {
                if let Some(prev) = merged.last_mut() {
                    if prev.end == token.start
                        && self.config.abbreviations.iter().any(|a| *a == prev.text)
                    {
                        prev.text.push('.');
                        prev.end = token.end;
                        continue;
                    }
                }
            }
            merged.push(token);
        }
        merged
    }
}

impl Tokenizer for DefaultTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut char_pos = 0;

        for segment in text.split_word_bounds() {
            let len = segment.chars().count();
            if !segment.chars().all(char::is_whitespace) {
                self.split_segment(segment, char_pos, &mut tokens);
            }
            char_pos += len;
        }

        let mut tokens = self.join_abbreviations(tokens);
        reindex(&mut tokens);
        tokens
    }
}

/// Tokeniza com o [`DefaultTokenizer`] e a configuração padrão.
pub fn tokenize(text: &str) -> Vec<Token> {
    DefaultTokenizer::default().tokenize(text)
}

/// Reatribui `index` na ordem da lista.
fn reindex(tokens: &mut [Token]) {
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
}

/// Fecha o token acumulado e adiciona à lista (se não vazio)
fn flush_token(tokens: &mut Vec<Token>, text: &mut String, start: usize, end: usize) {
    if !text.is_empty() {
        tokens.push(Token::new(text.clone(), start, end));
        text.clear();
    }
}
