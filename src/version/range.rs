//! Membership and range matching against a provider's supported versions
//!
//! Requirements are written the way platform ecosystems write them (npm style:
//! `>=14 <17`, `^3.9`, `3.x`, `1.2 || 2`, composer's `^7.3|^8.0`) and translated
//! into [`semver::VersionReq`]. A bare partial version means "any patch of it":
//! `3.9` matches `3.9.x`.

use super::info::{normalize, VersionInfo};
use semver::VersionReq;

const OPERATOR_CHARS: &[char] = &['^', '~', '<', '>', '=', '*', '|', ','];

/// True when the text is a range expression rather than a plain version
pub fn is_range_expression(text: &str) -> bool {
    let text = text.trim();
    text.contains(OPERATOR_CHARS)
        || text.contains(char::is_whitespace)
        || text.ends_with(".x")
        || text.ends_with(".X")
}

/// Parses a range into its alternatives, separated by `||` or composer's single `|`
pub fn parse_requirement(spec: &str) -> Option<Vec<VersionReq>> {
    let alternatives: Option<Vec<VersionReq>> = spec
        .split('|')
        .filter(|alternative| !alternative.trim().is_empty())
        .map(parse_alternative)
        .collect();
    alternatives.filter(|reqs| !reqs.is_empty())
}

/// True when a version hint read from a repository is a version or a range
///
/// Anything else (a virtualenv name, `latest`, `lts/*`) is not usable as a hint.
pub fn is_version_hint(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && (VersionInfo::parse(text).is_ok() || parse_requirement(text).is_some())
}

fn parse_alternative(alternative: &str) -> Option<VersionReq> {
    let alternative = alternative.trim();
    if alternative.is_empty() {
        return None;
    }
    if matches!(alternative, "*" | "x" | "X") {
        return Some(VersionReq::STAR);
    }

    let tokens = merge_operator_tokens(alternative);

    // npm hyphen range: "1.2.3 - 2.3.4"
    if let [low, dash, high] = tokens.as_slice() {
        if dash == "-" {
            let translated = format!(">={}, <={}", translate_version(low), translate_version(high));
            return VersionReq::parse(&translated).ok();
        }
    }

    let comparators: Vec<String> = tokens.iter().map(|t| translate_comparator(t)).collect();
    VersionReq::parse(&comparators.join(", ")).ok()
}

/// Splits on whitespace and commas, re-attaching operators written apart (`>= 14`)
fn merge_operator_tokens(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_operator = String::new();

    for raw in text.split(|c: char| c.is_whitespace() || c == ',') {
        if raw.is_empty() {
            continue;
        }
        if raw != "-" && raw.chars().all(|c| OPERATOR_CHARS.contains(&c)) {
            pending_operator.push_str(raw);
            continue;
        }
        tokens.push(format!("{}{}", std::mem::take(&mut pending_operator), raw));
    }
    tokens
}

fn translate_comparator(token: &str) -> String {
    let split_at = token
        .find(|c: char| !matches!(c, '^' | '~' | '<' | '>' | '='))
        .unwrap_or(token.len());
    let (operator, version) = token.split_at(split_at);
    let version = translate_version(version);

    // A bare version pins everything it names, like npm's "3.9" == "3.9.x"
    if operator.is_empty() && !version.contains(&['*', 'x', 'X'][..]) {
        format!("={}", version)
    } else {
        format!("{}{}", operator, version)
    }
}

fn translate_version(version: &str) -> String {
    let version = version.trim().trim_start_matches(&['v', 'V'][..]);
    if version.contains(|c: char| c.is_ascii_alphabetic() && c != 'x' && c != 'X') {
        normalize(version)
    } else {
        version.to_string()
    }
}

/// Highest version in `versions` satisfying `range`
///
/// ```
/// use buildsmith::version::max_satisfying;
///
/// let versions = ["3.8.12", "3.9.7", "3.9.16", "3.10.4"].map(String::from);
/// assert_eq!(max_satisfying("3.9", &versions).as_deref(), Some("3.9.16"));
/// assert_eq!(max_satisfying(">=3.8 <3.10", &versions).as_deref(), Some("3.9.16"));
/// assert_eq!(max_satisfying("4", &versions), None);
/// ```
pub fn max_satisfying(range: &str, versions: &[String]) -> Option<String> {
    let requirements = parse_requirement(range)?;
    versions
        .iter()
        .filter_map(|v| VersionInfo::parse(v).ok())
        .filter(|v| requirements.iter().any(|req| req.matches(v.semantic())))
        .max()
        .map(|v| v.display().to_string())
}

/// Finds the supported entry a candidate version resolves to
///
/// The first rule that matches wins:
/// 1. an entry equal to the candidate
/// 2. the highest entry satisfying the candidate read as a range
/// 3. the highest preview entry that starts with the candidate
/// 4. the candidate itself, when a range-valued entry accepts it
pub fn match_supported(candidate: &str, supported: &[String]) -> Option<String> {
    let candidate = candidate.trim();
    let bare = strip_v(candidate);

    if let Some(exact) = supported.iter().find(|s| strip_v(s.trim()) == bare) {
        return Some(exact.clone());
    }

    if let Some(best) = max_satisfying(candidate, supported) {
        return Some(best);
    }

    let preview = supported
        .iter()
        .filter(|s| s.contains(|c: char| c.is_ascii_alphabetic()) && s.starts_with(bare))
        .filter_map(|s| VersionInfo::parse(s).ok())
        .max();
    if let Some(preview) = preview {
        return Some(preview.display().to_string());
    }

    let concrete = VersionInfo::parse(candidate).ok()?;
    let accepted = supported
        .iter()
        .filter(|s| is_range_expression(s))
        .filter_map(|s| parse_requirement(s))
        .any(|reqs| reqs.iter().any(|req| req.matches(concrete.semantic())));
    accepted.then(|| candidate.to_string())
}

fn strip_v(text: &str) -> &str {
    text.strip_prefix(&['v', 'V'][..]).unwrap_or(text)
}
