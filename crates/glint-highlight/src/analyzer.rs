//! Text analysis for analyzer-based highlighting.
//!
//! Stored values are re-tokenized with the same pipeline the index uses, so that the
//! token texts line up with the indexed terms a query was expressed in:
//! 1. `SimpleTokenizer` - splits on whitespace and punctuation
//! 2. `LowerCaser` - converts tokens to lowercase
//! 3. `RemoveLongFilter` - removes tokens longer than 40 bytes
//! 4. `Stemmer` - applies language-specific stemming

use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer,
};

use crate::HighlightError;

/// Name under which the analyzer is registered with Tantivy.
pub const GLINT_TOKENIZER: &str = "glint_text";

/// Maximum token length in bytes before filtering.
const MAX_TOKEN_LENGTH: usize = 40;

/// Parses a stemmer language name (case-insensitive) into a Tantivy `Language`.
pub fn parse_language(name: &str) -> Result<Language, HighlightError> {
    match name.to_lowercase().as_str() {
        "arabic" => Ok(Language::Arabic),
        "danish" => Ok(Language::Danish),
        "dutch" => Ok(Language::Dutch),
        "english" => Ok(Language::English),
        "finnish" => Ok(Language::Finnish),
        "french" => Ok(Language::French),
        "german" => Ok(Language::German),
        "greek" => Ok(Language::Greek),
        "hungarian" => Ok(Language::Hungarian),
        "italian" => Ok(Language::Italian),
        "norwegian" => Ok(Language::Norwegian),
        "portuguese" => Ok(Language::Portuguese),
        "romanian" => Ok(Language::Romanian),
        "russian" => Ok(Language::Russian),
        "spanish" => Ok(Language::Spanish),
        "swedish" => Ok(Language::Swedish),
        "tamil" => Ok(Language::Tamil),
        "turkish" => Ok(Language::Turkish),
        other => Err(HighlightError::InvalidLanguage(other.to_string())),
    }
}

/// Builds the glint text analyzer with the specified stemmer language.
pub fn build_analyzer(language: Language) -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
        .filter(Stemmer::new(language))
        .build()
}

/// Builds the glint text analyzer from a language name.
pub fn build_analyzer_from_name(language_name: &str) -> Result<TextAnalyzer, HighlightError> {
    Ok(build_analyzer(parse_language(language_name)?))
}
