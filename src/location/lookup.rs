//! Matching free-text queries against a loaded option list.
//!
//! Order: exact code → case-insensitive name → unique prefix/substring →
//! closest name within edit distance 2.

use super::types::LocationOption;

const MAX_FUZZY_DISTANCE: usize = 2;

/// Compute edit distance between two strings (Levenshtein).
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n]
}

/// Lowercase, fold common Filipino/Spanish diacritics, collapse spaces.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .replace('ñ', "n")
        .replace('á', "a")
        .replace('é', "e")
        .replace('í', "i")
        .replace('ó', "o")
        .replace('ú', "u")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find the option a user meant by `query` (a code or a name).
pub fn match_option<'a>(options: &'a [LocationOption], query: &str) -> Option<&'a LocationOption> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(opt) = options.iter().find(|o| o.code == trimmed) {
        return Some(opt);
    }

    let q = normalize(trimmed);
    if let Some(opt) = options.iter().find(|o| normalize(&o.name) == q) {
        return Some(opt);
    }

    // Prefix then substring, only when unambiguous
    let prefixed: Vec<_> = options.iter().filter(|o| normalize(&o.name).starts_with(&q)).collect();
    if prefixed.len() == 1 {
        return Some(prefixed[0]);
    }
    let contained: Vec<_> = options.iter().filter(|o| normalize(&o.name).contains(&q)).collect();
    if contained.len() == 1 {
        return Some(contained[0]);
    }

    let mut best: Option<(&LocationOption, usize)> = None;
    for opt in options {
        let dist = edit_distance(&q, &normalize(&opt.name));
        if dist <= MAX_FUZZY_DISTANCE && best.map_or(true, |(_, d)| dist < d) {
            best = Some((opt, dist));
        }
    }
    best.map(|(opt, _)| opt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<LocationOption> {
        vec![
            LocationOption::new("072217000", "City of Cebu"),
            LocationOption::new("072230000", "City of Mandaue"),
            LocationOption::new("072226000", "City of Lapu-Lapu"),
            LocationOption::new("072251000", "Talisay"),
            LocationOption::new("072250000", "Dañao"),
        ]
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("talisay", "talisai"), 1);
        assert_eq!(edit_distance("abc", "abc"), 0);
    }

    #[test]
    fn test_match_by_code() {
        let opts = options();
        assert_eq!(match_option(&opts, "072230000").unwrap().name, "City of Mandaue");
    }

    #[test]
    fn test_match_by_name_case_insensitive() {
        let opts = options();
        assert_eq!(match_option(&opts, "TALISAY").unwrap().code, "072251000");
    }

    #[test]
    fn test_match_diacritics() {
        let opts = options();
        assert_eq!(match_option(&opts, "danao").unwrap().code, "072250000");
    }

    #[test]
    fn test_match_unique_substring() {
        let opts = options();
        assert_eq!(match_option(&opts, "mandaue").unwrap().code, "072230000");
    }

    #[test]
    fn test_ambiguous_prefix_falls_through() {
        let opts = options();
        // "city of" prefixes three names and is too far from any of them
        assert!(match_option(&opts, "city of").is_none());
    }

    #[test]
    fn test_match_fuzzy() {
        let opts = options();
        assert_eq!(match_option(&opts, "talisai").unwrap().code, "072251000");
    }

    #[test]
    fn test_match_empty_query() {
        assert!(match_option(&options(), "  ").is_none());
    }
}
