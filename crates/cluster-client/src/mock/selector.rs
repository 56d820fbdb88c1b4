//! Label selector matching for the mock cluster
//!
//! Supports `key=value`, `key==value`, `key!=value` and bare `key`
//! requirements joined by commas. Set-based requirements are not needed by
//! any caller and never match.

use std::collections::BTreeMap;

pub fn matches(selector: &str, labels: Option<&BTreeMap<String, String>>) -> bool {
    let empty = BTreeMap::new();
    let labels = labels.unwrap_or(&empty);

    selector
        .split(',')
        .map(str::trim)
        .filter(|req| !req.is_empty())
        .all(|req| requirement_matches(req, labels))
}

fn requirement_matches(requirement: &str, labels: &BTreeMap<String, String>) -> bool {
    if let Some((key, value)) = requirement.split_once("!=") {
        return labels.get(key.trim()).map(String::as_str) != Some(value.trim());
    }
    if let Some((key, value)) = requirement
        .split_once("==")
        .or_else(|| requirement.split_once('='))
    {
        return labels.get(key.trim()).map(String::as_str) == Some(value.trim());
    }
    if requirement.contains(' ') || requirement.contains('(') {
        return false;
    }
    labels.contains_key(requirement)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_equality_and_existence() {
        let l = labels(&[("monsoon.ianunruh.com/enabled", "true"), ("team", "a")]);
        assert!(matches("monsoon.ianunruh.com/enabled=true", Some(&l)));
        assert!(matches("team==a,monsoon.ianunruh.com/enabled", Some(&l)));
        assert!(!matches("team=b", Some(&l)));
        assert!(matches("team!=b", Some(&l)));
        assert!(!matches("missing", Some(&l)));
        assert!(!matches("team=a", None));
        assert!(matches("", None));
    }
}
