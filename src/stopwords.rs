//! Spanish + English stopwords used when counting terms.

use once_cell::sync::Lazy;
use std::collections::HashSet;

const WORDS: &[&str] = &[
    // es
    "que", "de", "la", "el", "en", "los", "del", "se", "las", "por", "un", "para", "con",
    "no", "una", "su", "al", "lo", "como", "más", "mas", "pero", "sus", "le", "ya", "este",
    "sí", "porque", "esta", "entre", "cuando", "muy", "sin", "sobre", "también", "me",
    "hasta", "hay", "donde", "quien", "desde", "todo", "nos", "durante", "todos", "uno",
    "les", "ni", "contra", "otros", "ese", "eso", "ante", "ellos", "esto", "mí", "antes",
    "algunos", "qué", "unos", "yo", "otro", "otras", "otra", "él", "tanto", "esa", "estos",
    "mucho", "quienes", "nada", "muchos", "cual", "poco", "ella", "estar", "estas",
    "algunas", "algo", "nosotros", "mi", "mis", "tú", "te", "ti", "tu", "tus", "ellas",
    "es", "son", "fue", "era", "ser", "está", "están", "tiene", "hoy", "vez", "así",
    // en
    "the", "and", "for", "that", "this", "with", "you", "are", "was", "have", "has", "not",
    "but", "from", "they", "his", "her", "its", "our", "their", "what", "all", "will",
    "just", "can", "about", "out", "who", "him", "she", "there", "been", "were", "had",
    "when", "than", "then", "them", "these", "those", "would", "could", "should",
    // post noise
    "rt", "via", "amp",
];

static SET: Lazy<HashSet<&'static str>> = Lazy::new(|| WORDS.iter().copied().collect());

pub fn is_stopword(token: &str) -> bool {
    SET.contains(token)
}
