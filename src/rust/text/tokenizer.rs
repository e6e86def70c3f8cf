use lazy_static::lazy_static;
use regex::Regex;

/// An ordered list of `(pattern, replacement)` rewrites.
type Rules = Vec<(Regex, &'static str)>;

fn compile(rules: &[(&str, &'static str)]) -> Rules {
    rules
        .iter()
        .map(|(pattern, replacement)| {
            (Regex::new(pattern).expect("tokenizer rules are valid regexes"), *replacement)
        })
        .collect()
}

lazy_static! {
    static ref STARTING_QUOTES: Rules = compile(&[
        (r#"^""#, "``"),
        (r"(``)", " ${1} "),
        (r#"([ (\[{<])("|'{2})"#, "${1} `` "),
    ]);

    static ref PUNCTUATION: Rules = compile(&[
        (r"([:,])([^\d])", " ${1} ${2}"),
        (r"([:,])$", " ${1} "),
        (r"\.\.\.", " ... "),
        (r"[;@#$%&]", " ${0} "),
        (r#"([^.])(\.)([\])}>"']*)\s*$"#, "${1} ${2}${3} "),
        (r"[?!]", " ${0} "),
        (r"([^'])' ", "${1} ' "),
    ]);

    static ref PARENS_BRACKETS: Rules = compile(&[(r"[\]\[(){}<>]", " ${0} ")]);

    static ref DOUBLE_DASHES: Rules = compile(&[(r"--", " -- ")]);

    static ref ENDING_QUOTES: Rules = compile(&[
        (r"''", " '' "),
        (r#"""#, " '' "),
        (r"([^' ])('[sS]|'[mM]|'[dD]|') ", "${1} ${2} "),
        (r"([^' ])('ll|'LL|'re|'RE|'ve|'VE|n't|N'T) ", "${1} ${2} "),
    ]);

    static ref CONTRACTIONS: Rules = compile(&[
        (r"(?i)\b(can)(not)\b", " ${1} ${2} "),
        (r"(?i)\b(d)('ye)\b", " ${1} ${2} "),
        (r"(?i)\b(gim)(me)\b", " ${1} ${2} "),
        (r"(?i)\b(gon)(na)\b", " ${1} ${2} "),
        (r"(?i)\b(got)(ta)\b", " ${1} ${2} "),
        (r"(?i)\b(lem)(me)\b", " ${1} ${2} "),
        (r"(?i)\b(more)('n)\b", " ${1} ${2} "),
        (r"(?i)\b(wan)(na)(\s)", " ${1} ${2} ${3}"),
        (r"(?i) ('t)(is)\b", " ${1} ${2} "),
        (r"(?i) ('t)(was)\b", " ${1} ${2} "),
    ]);
}

/// Canonical token for an opening or closing double quote.
pub const QUOTE_TOKEN: &str = "\"";

fn apply(rules: &Rules, text: String) -> String {
    rules.iter().fold(text, |text, (regex, replacement)| {
        regex.replace_all(&text, *replacement).into_owned()
    })
}

/// Rule-based word tokenizer following the Penn Treebank conventions.
///
/// Contractions are split (`don't` -> `do n't`), punctuation is separated from
/// words and a sentence-final period becomes its own token. The directional
/// quote tokens the Treebank rules produce (`` `` `` and `''`) are both emitted
/// as [`QUOTE_TOKEN`], which keeps tokenizing already-tokenized text stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreebankTokenizer;

impl TreebankTokenizer {
    pub fn new() -> Self {
        Self
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut text = apply(&STARTING_QUOTES, text.to_string());
        text = apply(&PUNCTUATION, text);
        text = apply(&PARENS_BRACKETS, text);
        text = apply(&DOUBLE_DASHES, text);

        text = format!(" {} ", text);
        text = apply(&ENDING_QUOTES, text);
        text = apply(&CONTRACTIONS, text);

        text.split_whitespace()
            .map(|token| match token {
                "``" | "''" => QUOTE_TOKEN.to_string(),
                other => other.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        TreebankTokenizer::new().tokenize(text)
    }

    #[test]
    fn test_splits_contractions() {
        assert_eq!(tokens("i don't know"), vec!["i", "do", "n't", "know"]);
        assert_eq!(tokens("she's gonna go"), vec!["she", "'s", "gon", "na", "go"]);
        assert_eq!(tokens("we cannot stop"), vec!["we", "can", "not", "stop"]);
        assert_eq!(tokens("i wanna dance"), vec!["i", "wan", "na", "dance"]);
        assert_eq!(tokens("you'll see"), vec!["you", "'ll", "see"]);
    }

    #[test]
    fn test_separates_punctuation() {
        assert_eq!(
            tokens("hello, world! (really?)"),
            vec!["hello", ",", "world", "!", "(", "really", "?", ")"]
        );
        assert_eq!(tokens("wait... what"), vec!["wait", "...", "what"]);
        assert_eq!(tokens("the end."), vec!["the", "end", "."]);
        assert_eq!(tokens("mr. jones left."), vec!["mr.", "jones", "left", "."]);
        assert_eq!(tokens("1,000 miles"), vec!["1,000", "miles"]);
    }

    #[test]
    fn test_quotes_become_canonical() {
        assert_eq!(
            tokens("he said \"run\" now"),
            vec!["he", "said", "\"", "run", "\"", "now"]
        );
        assert_eq!(tokens("\"hi\""), vec!["\"", "hi", "\""]);
    }

    #[test]
    fn test_tokenizing_tokens_is_stable() {
        let inputs = [
            "i don't wanna \"leave\" you... (ever), ok?",
            "'tis the season -- rock & roll!",
            "it's 5:30, gimme more'n that.",
        ];
        for input in inputs {
            let once = tokens(input);
            let twice = tokens(&once.join(" "));
            assert_eq!(once, twice, "input: {}", input);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(tokens("").is_empty());
        assert!(tokens("   ").is_empty());
    }
}
