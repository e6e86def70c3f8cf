mod lemmatizer;
mod normalizer;
pub mod stopwords;
mod tokenizer;

pub use lemmatizer::Lemmatizer;
pub use normalizer::TextNormalizer;
pub use tokenizer::{TreebankTokenizer, QUOTE_TOKEN};
