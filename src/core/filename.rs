use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static FORBIDDEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]+"#).unwrap());

/// Replaces each run of filesystem-reserved characters with a single `_`.
pub fn sanitize_file_name(name: &str) -> String {
    FORBIDDEN_RE.replace_all(name, "_").into_owned()
}

/// Gives every repeated name after the first a ` (n)` suffix, in order.
pub fn disambiguate(names: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, u32> = HashMap::new();
    let taken: std::collections::HashSet<&str> = names.iter().map(|n| n.as_str()).collect();
    let mut result = Vec::with_capacity(names.len());

    for name in names {
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            result.push(name.clone());
            continue;
        }
        let mut n = *count;
        let mut candidate = format!("{} ({})", name, n);
        while taken.contains(candidate.as_str()) || result.contains(&candidate) {
            n += 1;
            candidate = format!("{} ({})", name, n);
        }
        result.push(candidate);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_every_forbidden_char() {
        let chars = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
        for c in chars {
            let input = format!("test{}file", c);
            assert_eq!(sanitize_file_name(&input), "test_file", "char '{}'", c);
        }
    }

    #[test]
    fn sanitize_collapses_runs() {
        assert_eq!(sanitize_file_name("a<>b"), "a_b");
        assert_eq!(sanitize_file_name("Q&A: what?"), "Q&A_ what_");
    }

    #[test]
    fn sanitize_leaves_clean_names() {
        assert_eq!(sanitize_file_name("Intro"), "Intro");
        assert_eq!(sanitize_file_name("第1集 开场"), "第1集 开场");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = ["a:b?c", "<<>>", "Video: \"Best of 2024\" <HD> | 1080p", "a_b", ""];
        for input in inputs {
            let once = sanitize_file_name(input);
            assert_eq!(sanitize_file_name(&once), once);
        }
    }

    #[test]
    fn disambiguate_suffixes_repeats() {
        let names = vec!["Intro".to_string(), "Intro".to_string(), "Outro".to_string()];
        assert_eq!(disambiguate(&names), vec!["Intro", "Intro (2)", "Outro"]);
    }

    #[test]
    fn disambiguate_skips_existing_suffix() {
        let names = vec!["A".to_string(), "A".to_string(), "A (2)".to_string()];
        let result = disambiguate(&names);
        assert_eq!(result[0], "A");
        assert_eq!(result[2], "A (2)");
        assert_eq!(result[1], "A (3)");
    }

    #[test]
    fn disambiguate_no_collisions_untouched() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(disambiguate(&names), names);
    }
}
