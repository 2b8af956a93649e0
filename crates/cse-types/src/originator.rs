/// Returns the `ri`-shaped stem of an originator identifier, i.e. everything
/// after the last `/`. Unregistered originators (`C`, `S`, empty) are
/// returned unchanged.
pub fn stem(originator: &str) -> &str {
    originator.rsplit('/').next().unwrap_or(originator)
}

/// Whether `originator` is present in `allowed`, which may contain the
/// wildcard `*` (matches anything) or simple glob patterns with `*` as an
/// infix/prefix/suffix wildcard.
pub fn is_allowed_originator(originator: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|pattern| matches_originator(originator, pattern))
}

/// Matches a single originator against a single pattern. `*` alone matches
/// anything; `*` elsewhere in the pattern is a simple glob wildcard.
pub fn matches_originator(originator: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return originator == pattern;
    }
    let mut rest = originator;
    let mut parts = pattern.split('*').peekable();
    let mut first = true;
    while let Some(part) = parts.next() {
        if part.is_empty() {
            first = false;
            continue;
        }
        if first {
            if !rest.starts_with(part) {
                return false;
            }
            rest = &rest[part.len()..];
        } else if parts.peek().is_none() {
            return rest.ends_with(part);
        } else if let Some(idx) = rest.find(part) {
            rest = &rest[idx + part.len()..];
        } else {
            return false;
        }
        first = false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_anything() {
        assert!(matches_originator("Cfoo", "*"));
    }

    #[test]
    fn exact_match() {
        assert!(matches_originator("Cfoo", "Cfoo"));
        assert!(!matches_originator("Cfoo", "Cbar"));
    }

    #[test]
    fn prefix_glob() {
        assert!(matches_originator("Cfoobar", "Cfoo*"));
        assert!(!matches_originator("Cxfoobar", "Cfoo*"));
    }

    #[test]
    fn is_allowed_checks_all_patterns() {
        let allowed = vec!["Cfoo".to_string(), "S*".to_string()];
        assert!(is_allowed_originator("Sbar", &allowed));
        assert!(!is_allowed_originator("Xbar", &allowed));
    }

    #[test]
    fn stem_strips_path() {
        assert_eq!(stem("/in-cse/Cfoo"), "Cfoo");
        assert_eq!(stem("Cfoo"), "Cfoo");
    }
}
