//! Line-level classification and field extraction for the vendor layout.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::machine::Currency;

/// Bullet glyph the vendor document uses for spec and optional items.
pub(crate) const BULLET: char = '\u{f0d8}';

/// Words that cannot start a product title: conjunctions, prepositions and
/// known wrapped-description starters.
const CONTINUATION_STARTS: &[&str] = &[
    "SE", "QUE", "PARA", "LOS", "LAS", "CON", "EN", "EL", "LA", "UN", "UNA", "SIN", "POR", "NI",
    "O", "U", "E", "AL", "DEL", "EXTENSION", "HIDRAULICO", "HIDRAULICA", "NEUMATICOS", "IMPIDE",
    "BRUSCAMENTE", "ACCIDENTES",
];

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("static pattern compiles")
}

/// `U$S 6.087.=` / `AR$ 1.350.000.=` style amounts, Argentine
/// thousands-dot format. Almost everything in the document is U$S; the
/// AR$ marker flags the occasional peso price.
pub(crate) static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)(?:U\$S|AR\$)\s*([\d.,]+)\.="));

/// `U$S consultar`: the price exists but is only available on request.
pub(crate) static PRICE_ON_REQUEST_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)U\$S\s*consultar"));

pub(crate) static MODEL_CAPS_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^MODELO:\s*(.+)"));

pub(crate) static MODEL_INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^Modelo:\s*(.+)"));

static PAGE_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^P[\s\S]{0,12}g[\s\S]{0,5}ina\s*\|\s*\d+"));

static TITLE_KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?i)^(MODELO|OPCIONAL|OPCIONALES|PRECIO|LOS PRECIOS|FORMA DE)\b")
});

static OPTIONAL_SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^OPCIONAL(?:ES)?\s*(?:PARA\s+\w+)?\s*(?:PRECIO)?\s*:?\s*$"));

static UNATTACHED_OPTIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^OPCIONAL(?:ES)?\s+PARA\b"));

pub(crate) static OPTIONAL_INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^OPCIONAL(?:ES)?:"));

pub(crate) static OPTIONAL_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^OPCIONAL(?:ES)?\s*(?:PARA\s+\w+)?\s*:\s*"));

/// `MODELO: G.H.G. 6 . . . .` dot-leader tail after a model name.
pub(crate) static MODEL_DOT_LEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(\s+\.){2,}.*$"));

static TRAILING_DOTS_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"[\s.]+$"));

static DOT_RUN_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\.{2,}"));

static PREAMBLE_NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)^(ACOPLADOS?|CARGADOR|SIN FINES)\b"));

static FALLBACK_NOISE_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"^(ACOPLADOS?|CARGADOR)\b"));

static ACRONYM_WORD_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"[A-ZÁÉÍÓÚ]{2,}"));

/// Extract a `U$S` amount from a line. `1.234,56` reads as 1234.56.
pub(crate) fn parse_price(text: &str) -> Option<Decimal> {
    let captures = PRICE_RE.captures(text)?;
    let normalized = captures[1].trim().replace('.', "").replace(',', ".");
    Decimal::from_str(&normalized).ok()
}

pub(crate) fn has_price(text: &str) -> bool {
    PRICE_RE.is_match(text)
}

/// Currency of a price line: USD unless the peso marker is present.
pub(crate) fn currency_for(text: &str) -> Currency {
    if text.to_uppercase().contains("AR$") {
        Currency::Ars
    } else {
        Currency::Usd
    }
}

pub(crate) fn is_price_on_request(text: &str) -> bool {
    PRICE_ON_REQUEST_RE.is_match(text)
}

/// Variant prefix of a price line, e.g. `VUELCO MANUAL. . . U$S 6.087.=`
/// yields `VUELCO MANUAL`; a bare dot-leader line yields `None`.
pub(crate) fn extract_variant_name(price_line: &str) -> Option<String> {
    let without_price = PRICE_RE.replace_all(price_line, "");
    let without_dots = TRAILING_DOTS_RE.replace(without_price.trim(), "");
    let candidate = without_dots.trim();
    if candidate.chars().count() < 4 {
        return None;
    }
    if candidate.to_uppercase().starts_with("MODELO") {
        return None;
    }
    Some(candidate.to_string())
}

pub(crate) fn is_page_header(line: &str) -> bool {
    PAGE_HEADER_RE.is_match(line)
}

/// A product title is a substantial, mostly-uppercase line that is not a
/// price, model, optional, bullet or continuation line.
pub(crate) fn is_product_title(line: &str) -> bool {
    let line = line.trim();
    if line.chars().count() < 8 {
        return false;
    }
    if PAGE_HEADER_RE.is_match(line) || TITLE_KEYWORD_RE.is_match(line) {
        return false;
    }
    if PRICE_RE.is_match(line) || line.starts_with(BULLET) {
        return false;
    }
    if let Some(first_word) = line.split_whitespace().next() {
        let first_word = first_word.trim_end_matches(['.', ',', ';', ':']).to_uppercase();
        if CONTINUATION_STARTS.contains(&first_word.as_str()) {
            return false;
        }
    }

    let alpha: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    if alpha.len() < 5 {
        return false;
    }
    let upper = alpha.iter().filter(|c| c.is_uppercase()).count();
    upper as f64 / alpha.len() as f64 >= 0.75
}

pub(crate) fn is_optional_section(line: &str) -> bool {
    OPTIONAL_SECTION_RE.is_match(line.trim())
}

pub(crate) fn is_unattached_optional_marker(line: &str) -> bool {
    UNATTACHED_OPTIONAL_RE.is_match(line.trim())
}

pub(crate) fn clean_spec(line: &str) -> String {
    line.trim().trim_start_matches(BULLET).trim().to_string()
}

/// Strip price text and dot leaders out of an optional item name.
pub(crate) fn clean_optional_name(text: &str) -> String {
    let without_price = PRICE_RE.replace_all(text, "");
    let without_request = PRICE_ON_REQUEST_RE.replace_all(&without_price, "");
    let without_runs = DOT_RUN_RE.replace_all(without_request.trim(), "");
    TRAILING_DOTS_RE.replace(without_runs.trim(), "").trim().to_string()
}

pub(crate) fn is_preamble_noise(line: &str) -> bool {
    PREAMBLE_NOISE_RE.is_match(line)
}

pub(crate) fn is_fallback_noise(line: &str) -> bool {
    FALLBACK_NOISE_RE.is_match(line)
}

/// Category inferred from title keywords; order matters (TRIVUELCO before
/// VOLCADOR, trailers before generic acoplados).
pub(crate) fn category_for_title(title: &str) -> String {
    let t = title.to_uppercase();
    let category = if t.contains("TOLVA") {
        "Tolvas"
    } else if t.contains("TRIVUELCO") {
        "Volcadores Trivuelco"
    } else if t.contains("VOLCADOR") {
        "Volcadores"
    } else if t.contains("PLAYO") || (t.contains("BARANDAS") && !t.contains("VOLCAD")) {
        "Acoplados Playos"
    } else if t.contains("BALANCIN") || t.contains("TRAILER") {
        "Trailers"
    } else if t.contains("VAQUERO") {
        "Vaqueros"
    } else if t.contains("ROLLO") {
        "Transportadores de Rollos"
    } else if t.contains("SIN FIN") {
        "Sinfines"
    } else if t.contains("NIVELADORA") || t.contains("HOJA") {
        "Hojas Niveladoras"
    } else if t.contains("GRUA") {
        "Gruas"
    } else if t.contains("PALA") {
        "Palas"
    } else if t.contains("ELEVADOR") {
        "Elevadores"
    } else {
        "Maquinaria Agricola"
    };
    category.to_string()
}

/// Stable product code: the compacted model name when present, otherwise
/// a title acronym with a positional index.
pub(crate) fn generate_code(product_title: &str, model_name: &str, index: usize) -> String {
    let model_compact: String = model_name
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if model_compact.chars().count() >= 2 {
        return model_compact.chars().take(14).collect();
    }

    let title_upper = product_title.to_uppercase();
    let acronym: String = ACRONYM_WORD_RE
        .find_iter(&title_upper)
        .filter_map(|word| word.as_str().chars().next())
        .take(6)
        .collect();
    if acronym.is_empty() {
        format!("PROD{index:03}")
    } else {
        format!("{acronym}{index:02}")
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        category_for_title, clean_optional_name, extract_variant_name, generate_code,
        is_optional_section, is_page_header, is_product_title, parse_price,
    };

    #[test]
    fn parses_argentine_formatted_prices() {
        assert_eq!(parse_price("MODELO: X . . . U$S 6.087.="), Some(Decimal::from(6_087)));
        assert_eq!(
            parse_price("algo U$S 1.234,56.="),
            Some(Decimal::from_str_exact("1234.56").expect("decimal"))
        );
        assert_eq!(parse_price("U$S consultar"), None);
        assert_eq!(parse_price("sin precio"), None);
    }

    #[test]
    fn variant_name_requires_a_substantial_prefix() {
        assert_eq!(
            extract_variant_name("VUELCO MANUAL. . . . . . . U$S 6.087.="),
            Some("VUELCO MANUAL".to_string())
        );
        assert_eq!(extract_variant_name(". . . . . . . U$S 10.777.="), None);
        assert_eq!(extract_variant_name("MODELO: X U$S 1.000.="), None);
    }

    #[test]
    fn title_detection_rejects_continuations_and_prices() {
        assert!(is_product_title("ACOPLADO VOLCADOR TRIVUELCO DE USO RURAL"));
        assert!(!is_product_title("SE ENTREGA CON RUEDAS"));
        assert!(!is_product_title("VUELCO MANUAL. . . U$S 6.087.="));
        assert!(!is_product_title("Modelo: A.V.A. 4000"));
        assert!(!is_product_title("OPCIONALES PRECIO"));
        assert!(!is_product_title("corta"));
        assert!(!is_product_title("Descripcion en minusculas del acoplado"));
    }

    #[test]
    fn page_headers_are_recognized_with_spaced_glyphs() {
        assert!(is_page_header("P á g ina | 3"));
        assert!(is_page_header("Pagina | 12"));
        assert!(!is_page_header("PALA DE ARRASTRE"));
    }

    #[test]
    fn optional_section_markers_allow_suffix_variants() {
        assert!(is_optional_section("OPCIONALES PRECIO"));
        assert!(is_optional_section("OPCIONAL:"));
        assert!(is_optional_section("OPCIONALES PARA TOLVAS"));
        assert!(!is_optional_section("OPCIONAL: cobertor de lona U$S 200.="));
    }

    #[test]
    fn peso_marked_prices_parse_and_carry_ars() {
        use crate::domain::machine::Currency;

        use super::currency_for;

        assert_eq!(parse_price("AR$ 1.350.000.="), Some(Decimal::from(1_350_000)));
        assert_eq!(currency_for("AR$ 1.350.000.="), Currency::Ars);
        assert_eq!(currency_for("MODELO: X . . . U$S 6.087.="), Currency::Usd);
    }

    #[test]
    fn optional_names_lose_prices_and_dot_leaders() {
        assert_eq!(clean_optional_name("Ruedas duales . . . U$S 350.="), "Ruedas duales");
        assert_eq!(clean_optional_name("Hidraulico al tractor U$S consultar"), "Hidraulico al tractor");
    }

    #[test]
    fn categories_follow_title_keywords() {
        assert_eq!(category_for_title("ACOPLADO TOLVA CEREALERO"), "Tolvas");
        assert_eq!(category_for_title("ACOPLADO VOLCADOR TRIVUELCO"), "Volcadores Trivuelco");
        assert_eq!(category_for_title("ACOPLADO VOLCADOR MANUAL"), "Volcadores");
        assert_eq!(category_for_title("CARRO DESCONOCIDO GRANDE"), "Maquinaria Agricola");
    }

    #[test]
    fn codes_prefer_compacted_model_names() {
        assert_eq!(generate_code("ACOPLADO TOLVA", "A.T.F. 10", 4), "ATF10");
        assert_eq!(generate_code("ACOPLADO VOLCADOR TRIVUELCO", "", 7), "AVT07");
        assert_eq!(generate_code("...", "", 9), "PROD009");
    }
}
