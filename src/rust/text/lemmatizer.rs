use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;

use lazy_static::lazy_static;

lazy_static! {
    /// Irregular noun plurals and `-ie` nouns the suffix rules would get wrong.
    static ref IRREGULAR_NOUNS: HashMap<&'static str, &'static str> = [
        ("men", "man"), ("women", "woman"), ("children", "child"), ("feet", "foot"),
        ("teeth", "tooth"), ("geese", "goose"), ("mice", "mouse"), ("lice", "louse"),
        ("oxen", "ox"), ("dice", "die"), ("people", "people"), ("brethren", "brother"),
        ("knives", "knife"), ("wives", "wife"), ("lives", "life"), ("wolves", "wolf"),
        ("leaves", "leaf"), ("halves", "half"), ("selves", "self"), ("thieves", "thief"),
        ("shelves", "shelf"), ("loaves", "loaf"), ("calves", "calf"), ("elves", "elf"),
        ("scarves", "scarf"), ("hooves", "hoof"), ("themselves", "themselves"),
        ("ourselves", "ourselves"), ("yourselves", "yourselves"), ("crises", "crisis"),
        ("analyses", "analysis"), ("theses", "thesis"), ("criteria", "criterion"),
        ("phenomena", "phenomenon"), ("data", "datum"), ("movies", "movie"),
        ("cookies", "cookie"), ("zombies", "zombie"), ("rookies", "rookie"),
        ("hippies", "hippie"), ("goalies", "goalie"), ("brownies", "brownie"),
        ("pixies", "pixie"), ("hoodies", "hoodie"), ("selfies", "selfie"),
        ("calories", "calorie"), ("lies", "lie"), ("ties", "tie"), ("pies", "pie"),
        ("dies", "die"), ("species", "species"), ("series", "series"),
        ("news", "news"), ("lens", "lens"), ("gas", "gas"), ("christmas", "christmas"),
        ("jesus", "jesus"), ("always", "always"), ("sometimes", "sometimes"),
        ("perhaps", "perhaps"), ("towards", "towards"), ("afterwards", "afterwards"),
        ("whereas", "whereas"), ("yes", "yes"), ("tis", "tis"), ("thus", "thus"),
        ("chaos", "chaos"), ("goes", "goes"), ("diabetes", "diabetes"), ("besides", "besides"),
        ("atlas", "atlas"), ("canvas", "canvas"), ("bias", "bias"), ("kudos", "kudos"),
        ("herpes", "herpes"), ("rabies", "rabies"), ("whereabouts", "whereabouts"),
    ]
    .into_iter()
    .collect();
}

/// Suffix detachment rules, tried in order; the first rule that applies wins.
const DETACHMENT_RULES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("ies", "y"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("s", ""),
];

/// Endings that already look like a singular noun and are left alone.
const PROTECTED_ENDINGS: &[&str] = &["ss", "us", "is"];

const MIN_CANDIDATE_LEN: usize = 4;

/// Reduces tokens to their noun base form.
///
/// Lookup order is the exception table first, then the suffix rules. When a
/// WordNet noun index is loaded with [`with_noun_index`](Self::with_noun_index),
/// a suffix rule only applies if it yields a known noun, and a word that is
/// itself a known noun is kept. Without an index the rules apply blindly,
/// which can over-strip words such as `chaos` that are not in the exception
/// table. Every lemma produced here lemmatizes to itself.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: HashMap<String, String>,
    bases: HashSet<String>,
    nouns: Option<HashSet<String>>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        let exceptions: HashMap<String, String> = IRREGULAR_NOUNS
            .iter()
            .map(|(inflected, base)| (inflected.to_string(), base.to_string()))
            .collect();
        let bases = exceptions.values().cloned().collect();
        Self {
            exceptions,
            bases,
            nouns: None,
        }
    }
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges an exception list in the WordNet `noun.exc` format
    /// (`inflected base [base ...]` per line, first base wins).
    pub fn with_exception_file<P: AsRef<Path>>(mut self, path: P) -> io::Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let mut added = 0;
        for line in contents.lines() {
            let mut fields = line.split_whitespace();
            if let (Some(inflected), Some(base)) = (fields.next(), fields.next()) {
                let inflected = inflected.replace('_', " ").to_lowercase();
                let base = base.replace('_', " ").to_lowercase();
                // Lemmas must stay fixed points.
                let conflicting = self.exceptions.contains_key(&base)
                    || self.exceptions.contains_key(&inflected)
                    || self.bases.contains(&inflected);
                if !conflicting && self.detach(&base) == base {
                    self.bases.insert(base.clone());
                    self.exceptions.insert(inflected, base);
                    added += 1;
                }
            }
        }
        log::info!("Loaded {} lemma exceptions from {:?}", added, path.as_ref());
        Ok(self)
    }

    /// Loads the lemma column of a WordNet `index.noun` file.
    ///
    /// Header lines (indented with spaces) are skipped. Loading again adds to
    /// the set already held.
    pub fn with_noun_index<P: AsRef<Path>>(mut self, path: P) -> io::Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let nouns = self.nouns.get_or_insert_with(HashSet::new);
        let before = nouns.len();
        for line in contents.lines().filter(|line| !line.starts_with(' ')) {
            if let Some(lemma) = line.split_whitespace().next() {
                nouns.insert(lemma.replace('_', " ").to_lowercase());
            }
        }
        log::info!(
            "Loaded {} nouns from {:?}",
            nouns.len() - before,
            path.as_ref()
        );
        Ok(self)
    }

    pub fn has_noun_index(&self) -> bool {
        self.nouns.is_some()
    }

    pub fn lemmatize(&self, token: &str) -> String {
        if let Some(base) = self.exceptions.get(token) {
            return base.clone();
        }
        if self.bases.contains(token) {
            return token.to_string();
        }
        let lemma = self.detach(token);
        match self.exceptions.get(&lemma) {
            Some(base) => base.clone(),
            None => lemma,
        }
    }

    fn detach(&self, token: &str) -> String {
        if token.chars().count() < MIN_CANDIDATE_LEN || !token.chars().all(char::is_alphabetic) {
            return token.to_string();
        }
        if PROTECTED_ENDINGS.iter().any(|ending| token.ends_with(ending)) {
            return token.to_string();
        }

        let mut candidates = DETACHMENT_RULES.iter().filter_map(|(suffix, replacement)| {
            token
                .strip_suffix(suffix)
                .filter(|stem| !stem.is_empty())
                .map(|stem| format!("{}{}", stem, replacement))
        });
        let lemma = match &self.nouns {
            None => candidates.next(),
            Some(nouns) if nouns.contains(token) => None,
            Some(nouns) => candidates.find(|candidate| nouns.contains(candidate)),
        };
        lemma.unwrap_or_else(|| token.to_string())
    }
}
