//! Parsing of operator-authored reaction-role lists.
//!
//! Operators paste blocks like `🎮 "Gamer" 5, <:pepe:123456>: Memes` and
//! expect every valid binding to take effect even when one line contains a
//! typo. The parser therefore never fails as a whole: malformed bindings
//! are collected as human-readable errors while the rest parse normally.
//!
//! Grammar:
//!
//! ```text
//! input   := binding (sep binding)*        sep := "," | ";" | newline
//! binding := emoji [":"] [role] [limit]
//! emoji   := "<" ["a"] ":" name ":" id ">" | unicode-emoji [U+FE0F]
//! role    := '"' name '"' | "<@&" id ">" | "@&" id | bare text
//! limit   := (":" | whitespace) integer    trailing, 1..=1000
//! ```
//!
//! A binding's emoji and role may sit in one segment (`🎮 Gamer`) or in
//! adjacent segments (`🎮, Gamer`); a segment that holds nothing but an
//! emoji (and at most a limit) takes the following segment as its role
//! reference, unless that segment opens a new binding with its own emoji.

use crate::model::id::RoleId;

/// One emoji→role binding extracted from operator input.
///
/// A mention-style role token fills both `role_name` (the full mention
/// text) and `role_id`; a quoted or bare name fills only `role_name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleReactionSpec {
    pub emoji: String,
    pub role_name: Option<String>,
    pub role_id: Option<RoleId>,
    /// Bounds concurrent holders of the role through this binding.
    pub limit: Option<u32>,
}

impl RoleReactionSpec {
    /// The role reference used when naming this entry in error messages.
    fn reference(&self) -> &str {
        match &self.role_name {
            Some(name) => name,
            None => "",
        }
    }
}

/// Accepted bindings plus one message per rejected input token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub roles: Vec<RoleReactionSpec>,
    pub errors: Vec<String>,
}

/// Parses a block of operator input into emoji→role bindings.
///
/// Pure and deterministic. Bad tokens are isolated: each appends one entry
/// to [`ParseResult::errors`] and parsing continues with the next binding.
/// Accepted entries keep their input order and never share an emoji.
pub fn parse_role_string(input: &str) -> ParseResult {
    let input = unescape_html(input.trim());

    let segments: Vec<&str> = input
        .split(|c| matches!(c, ',' | ';' | '\n'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut result = ParseResult::default();

    let mut i = 0;
    while i < segments.len() {
        let segment = segments[i];
        i += 1;

        let emoji = match emoji_token(segment) {
            Some(emoji) => emoji,
            None => {
                result
                    .errors
                    .push(format!("Invalid or missing emoji in part: \"{}\"", segment));
                continue;
            }
        };

        let mut rest = segment[emoji.len()..].trim_start();
        if let Some(stripped) = rest.strip_prefix(':') {
            rest = stripped.trim_start();
        }

        let mut part = segment.to_string();

        let (role_text, limit_text) = split_trailing_limit(rest);
        let mut role_text = role_text.to_string();
        let mut limit_text = limit_text.map(str::to_string);

        // `🎮:5` leaves a bare number behind the emoji. That is a limit,
        // with the role reference expected in the following segment.
        if limit_text.is_none() && is_digits(&role_text) {
            limit_text = Some(role_text);
            role_text = String::new();
        }

        // Pull the role reference out of the next segment when this one
        // carried only the emoji (and possibly a limit).
        if role_text.is_empty() && i < segments.len() && emoji_token(segments[i]).is_none() {
            let next = segments[i];
            i += 1;
            part = format!("{}, {}", segment, next);

            match limit_text {
                Some(_) => role_text = next.to_string(),
                None => {
                    let (text, limit) = split_trailing_limit(next);
                    role_text = text.to_string();
                    limit_text = limit.map(str::to_string);
                }
            }
        }

        let (role_name, role_id) = match role_reference(&role_text) {
            Ok(role) => role,
            Err(RoleRefError::MalformedQuote) => {
                result
                    .errors
                    .push(format!("Invalid quoted role name in part: \"{}\"", part));
                continue;
            }
            Err(RoleRefError::Missing) => {
                result
                    .errors
                    .push(format!("Invalid role name in part: \"{}\"", part));
                continue;
            }
        };

        let limit = match limit_text {
            Some(text) => match text.parse::<u32>() {
                Ok(limit) if (1..=1000).contains(&limit) => Some(limit),
                _ => {
                    result.errors.push(format!(
                        "Invalid user limit in part: \"{}\" (must be 1-1000)",
                        part
                    ));
                    continue;
                }
            },
            None => None,
        };

        let spec = RoleReactionSpec {
            emoji: emoji.to_string(),
            role_name,
            role_id,
            limit,
        };

        if let Some(existing) = result.roles.iter().find(|r| r.emoji == spec.emoji) {
            result.errors.push(format!(
                "Duplicate emoji {} found for roles: \"{}\" and \"{}\"",
                spec.emoji,
                existing.reference(),
                spec.reference()
            ));
            continue;
        }

        result.roles.push(spec);
    }

    result
}

/// Undoes the HTML entity encoding some client surfaces apply, so that
/// mention and custom-emoji tokens survive `&lt;@&amp;123&gt;` transport.
fn unescape_html(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Returns the emoji token at the start of `s`, if any.
fn emoji_token(s: &str) -> Option<&str> {
    if let Some(len) = custom_emoji_len(s) {
        return Some(&s[..len]);
    }

    let mut chars = s.chars();
    let first = chars.next()?;
    if !is_unicode_emoji(first) {
        return None;
    }

    let mut len = first.len_utf8();
    if chars.next() == Some('\u{FE0F}') {
        len += '\u{FE0F}'.len_utf8();
    }

    Some(&s[..len])
}

/// Length of a leading custom-emoji token `<a:name:id>` / `<:name:id>`.
fn custom_emoji_len(s: &str) -> Option<usize> {
    let rest = s.strip_prefix('<')?;
    let rest = rest.strip_prefix('a').unwrap_or(rest);
    let rest = rest.strip_prefix(':')?;

    let (name, rest) = rest.split_once(':')?;
    if name.is_empty() || name.contains('>') {
        return None;
    }

    let end = rest.find('>')?;
    if !is_digits(&rest[..end]) {
        return None;
    }

    Some(s.len() - rest.len() + end + 1)
}

/// Single-code-point Unicode emoji test. An explicit range table over the
/// emoji presentation blocks; keycap digits and bare `#`/`*` are excluded
/// so a stray number is never mistaken for a reaction trigger.
fn is_unicode_emoji(c: char) -> bool {
    matches!(c,
        '\u{1F1E6}'..='\u{1F1FF}'   // regional indicators
        | '\u{1F300}'..='\u{1F5FF}' // symbols & pictographs
        | '\u{1F600}'..='\u{1F64F}' // emoticons
        | '\u{1F680}'..='\u{1F6FF}' // transport
        | '\u{1F900}'..='\u{1F9FF}' // supplemental symbols
        | '\u{1FA70}'..='\u{1FAFF}' // symbols extended-A
        | '\u{2190}'..='\u{21FF}'   // arrows
        | '\u{2300}'..='\u{23FF}'   // technical, clocks
        | '\u{25A0}'..='\u{25FF}'   // geometric shapes
        | '\u{2600}'..='\u{27BF}'   // misc symbols, dingbats
        | '\u{2B00}'..='\u{2BFF}'   // arrows, stars, squares
        | '\u{2934}'
        | '\u{2935}'
        | '\u{3030}'
        | '\u{303D}'
        | '\u{3297}'
        | '\u{3299}'
        | '\u{00A9}'
        | '\u{00AE}'
        | '\u{2122}'
        | '\u{2139}'
        | '\u{FE0F}')
}

/// Splits a trailing `:N` / ` N` limit token off `s`.
fn split_trailing_limit(s: &str) -> (&str, Option<&str>) {
    let bytes = s.as_bytes();

    let mut start = bytes.len();
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }

    if start == bytes.len() || start == 0 {
        return (s, None);
    }

    let sep = bytes[start - 1];
    if sep == b':' || sep.is_ascii_whitespace() {
        (s[..start - 1].trim_end(), Some(&s[start..]))
    } else {
        (s, None)
    }
}

enum RoleRefError {
    MalformedQuote,
    Missing,
}

/// Parses the role-reference token: quoted name, full mention, `@&id`
/// shorthand, or a bare display name.
fn role_reference(s: &str) -> Result<(Option<String>, Option<RoleId>), RoleRefError> {
    if s.is_empty() {
        return Err(RoleRefError::Missing);
    }

    if s.starts_with('"') {
        let inner = s
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .filter(|inner| !inner.is_empty() && !inner.contains('"'));

        return match inner {
            Some(name) => Ok((Some(name.to_string()), None)),
            None => Err(RoleRefError::MalformedQuote),
        };
    }

    if let Ok(role_id) = s.parse::<RoleId>() {
        return Ok((Some(s.to_string()), Some(role_id)));
    }

    if let Some(digits) = s.strip_prefix("@&") {
        if is_digits(digits) {
            if let Ok(id) = digits.parse() {
                return Ok((Some(format!("<{}>", s)), Some(RoleId(id))));
            }
        }
    }

    Ok((Some(s.to_string()), None))
}

#[cfg(test)]
mod tests {
    use super::{parse_role_string, RoleReactionSpec};
    use crate::model::id::RoleId;

    fn spec(emoji: &str, role_name: Option<&str>, role_id: Option<u64>, limit: Option<u32>) -> RoleReactionSpec {
        RoleReactionSpec {
            emoji: emoji.to_string(),
            role_name: role_name.map(str::to_string),
            role_id: role_id.map(RoleId),
            limit,
        }
    }

    #[test]
    fn test_emoji_and_role_in_adjacent_segments() {
        let result = parse_role_string("🎮, Gamer");
        assert_eq!(result.roles, vec![spec("🎮", Some("Gamer"), None, None)]);
        assert_eq!(result.errors, Vec::<String>::new());
    }

    #[test]
    fn test_emoji_and_role_in_one_segment() {
        let result = parse_role_string("🎮 Gamer");
        assert_eq!(result.roles, vec![spec("🎮", Some("Gamer"), None, None)]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_limit_behind_emoji() {
        let result = parse_role_string("🎮:5, Gamer");
        assert_eq!(result.roles, vec![spec("🎮", Some("Gamer"), None, Some(5))]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_limit_behind_role() {
        let result = parse_role_string("🎮 Gamer:25");
        assert_eq!(result.roles, vec![spec("🎮", Some("Gamer"), None, Some(25))]);
        assert!(result.errors.is_empty());

        let result = parse_role_string("🎮, Gamer 25");
        assert_eq!(result.roles, vec![spec("🎮", Some("Gamer"), None, Some(25))]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_limit_out_of_range() {
        let result = parse_role_string("🎮:5000, A");
        assert!(result.roles.is_empty());
        assert_eq!(
            result.errors,
            vec!["Invalid user limit in part: \"🎮:5000, A\" (must be 1-1000)"]
        );

        let result = parse_role_string("🎮 Gamer:0");
        assert!(result.roles.is_empty());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_duplicate_emoji() {
        let result = parse_role_string("🎮, A, 🎮, B");
        assert_eq!(result.roles, vec![spec("🎮", Some("A"), None, None)]);
        assert_eq!(
            result.errors,
            vec!["Duplicate emoji 🎮 found for roles: \"A\" and \"B\""]
        );
    }

    #[test]
    fn test_missing_emoji() {
        let result = parse_role_string("Gamer");
        assert!(result.roles.is_empty());
        assert_eq!(
            result.errors,
            vec!["Invalid or missing emoji in part: \"Gamer\""]
        );
    }

    #[test]
    fn test_missing_role() {
        let result = parse_role_string("🎮");
        assert!(result.roles.is_empty());
        assert_eq!(result.errors, vec!["Invalid role name in part: \"🎮\""]);

        // A following segment that opens its own binding is not a role
        // reference for the previous emoji.
        let result = parse_role_string("🎮, 🔥 Mods");
        assert_eq!(result.roles, vec![spec("🔥", Some("Mods"), None, None)]);
        assert_eq!(result.errors, vec!["Invalid role name in part: \"🎮\""]);
    }

    #[test]
    fn test_quoted_role_name() {
        let result = parse_role_string("🎮 \"Night Crew\"");
        assert_eq!(result.roles, vec![spec("🎮", Some("Night Crew"), None, None)]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_malformed_quoted_role_name() {
        let result = parse_role_string("🎮 \"Night Crew");
        assert!(result.roles.is_empty());
        assert_eq!(
            result.errors,
            vec!["Invalid quoted role name in part: \"🎮 \"Night Crew\""]
        );
    }

    #[test]
    fn test_role_mention() {
        let result = parse_role_string("🎮 <@&123456789>");
        assert_eq!(
            result.roles,
            vec![spec("🎮", Some("<@&123456789>"), Some(123456789), None)]
        );
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_role_mention_shorthand() {
        let result = parse_role_string("🎮 @&123456789");
        assert_eq!(
            result.roles,
            vec![spec("🎮", Some("<@&123456789>"), Some(123456789), None)]
        );
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_html_escaped_mention() {
        let result = parse_role_string("🎮 &lt;@&amp;42&gt;");
        assert_eq!(result.roles, vec![spec("🎮", Some("<@&42>"), Some(42), None)]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_custom_emoji() {
        let result = parse_role_string("<:pepe:112233>: Memes, <a:party:445566> \"VIP\" 10");
        assert_eq!(
            result.roles,
            vec![
                spec("<:pepe:112233>", Some("Memes"), None, None),
                spec("<a:party:445566>", Some("VIP"), None, Some(10)),
            ]
        );
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_separators() {
        let result = parse_role_string("🎮 A; 🔥 B\n🚀 C");
        assert_eq!(
            result.roles,
            vec![
                spec("🎮", Some("A"), None, None),
                spec("🔥", Some("B"), None, None),
                spec("🚀", Some("C"), None, None),
            ]
        );
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_variation_selector() {
        let result = parse_role_string("⭐\u{FE0F} Stars");
        assert_eq!(
            result.roles,
            vec![spec("⭐\u{FE0F}", Some("Stars"), None, None)]
        );
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let result = parse_role_string("   ");
        assert!(result.roles.is_empty());
        assert!(result.errors.is_empty());
    }

    // Accepted entries serialized back to text parse to the same result
    // with zero errors.
    #[test]
    fn test_round_trip() {
        let input = "🎮 \"Night Crew\" 5, <:pepe:112233>: Memes; 🚀 <@&987654321>";
        let first = parse_role_string(input);
        assert!(first.errors.is_empty());

        let serialized = first
            .roles
            .iter()
            .map(|spec| {
                let name = spec.role_name.as_deref().unwrap();
                let role = match name.contains(' ') {
                    true => format!("\"{}\"", name),
                    false => name.to_string(),
                };

                match spec.limit {
                    Some(limit) => format!("{} {} {}", spec.emoji, role, limit),
                    None => format!("{} {}", spec.emoji, role),
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let second = parse_role_string(&serialized);
        assert!(second.errors.is_empty());
        assert_eq!(first.roles, second.roles);
    }
}
