//! Bus-range expansion for literal names.
//!
//! `data[0:3]` stands for `data[0]`, `data[1]`, `data[2]` and `data[3]`.
//! Several ranges in one name expand as a cartesian product, leftmost range
//! outermost.

use std::sync::LazyLock;

use regex::Regex;

static BUS_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+):(\d+)\]").expect("bus range pattern is valid"));

/// Upper bound on the number of names a single literal may expand to.
pub const EXPANSION_LIMIT: usize = 65_536;

/// Result of [`expand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// The text contains no `[a:b]` range.
    NotBus,
    /// Every concrete name, in order.
    Names(Vec<String>),
    /// Expanding would exceed the limit.
    TooLarge,
}

/// Expands every `[a:b]` range in `text`, refusing to produce more than
/// `limit` names.
pub fn expand(text: &str, limit: usize) -> Expansion {
    let mut names = vec![String::new()];
    let mut last = 0;
    let mut found = false;

    for captures in BUS_RANGE.captures_iter(text) {
        let whole = &captures[0];
        let start = captures.get(0).map_or(last, |m| m.start());
        let prefix = &text[last..start];
        last = start + whole.len();

        let (Ok(a), Ok(b)) = (captures[1].parse::<u64>(), captures[2].parse::<u64>()) else {
            // Out-of-range numbers are kept as plain text.
            for name in &mut names {
                name.push_str(prefix);
                name.push_str(whole);
            }
            continue;
        };
        found = true;

        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let width = usize::try_from(hi - lo).ok().and_then(|w| w.checked_add(1));
        let total = width.and_then(|w| w.checked_mul(names.len()));
        if total.is_none_or(|total| total > limit) {
            return Expansion::TooLarge;
        }

        names = names
            .iter()
            .flat_map(|name| (lo..=hi).map(move |i| format!("{name}{prefix}[{i}]")))
            .collect();
    }

    if !found {
        return Expansion::NotBus;
    }
    let suffix = &text[last..];
    for name in &mut names {
        name.push_str(suffix);
    }
    Expansion::Names(names)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("mynet[1:3]", &["mynet[1]", "mynet[2]", "mynet[3]"]; "single range")]
    #[test_case("mynet[3:1]", &["mynet[1]", "mynet[2]", "mynet[3]"]; "reversed range")]
    #[test_case("my[1:2]net[3:4]", &["my[1]net[3]", "my[1]net[4]", "my[2]net[3]", "my[2]net[4]"]; "two ranges")]
    #[test_case("a[0:1]_b", &["a[0]_b", "a[1]_b"]; "suffix kept")]
    #[test_case("bit[5:5]", &["bit[5]"]; "degenerate range")]
    fn expands(text: &str, expected: &[&str]) {
        assert_eq!(
            expand(text, EXPANSION_LIMIT),
            Expansion::Names(expected.iter().map(ToString::to_string).collect())
        );
    }

    #[test_case("VDD")]
    #[test_case("bus[3]")]
    #[test_case("bus[a:b]")]
    fn plain_names_are_not_buses(text: &str) {
        assert_eq!(expand(text, EXPANSION_LIMIT), Expansion::NotBus);
    }

    #[test]
    fn limit_is_enforced() {
        assert_eq!(
            expand("x[0:9]", 10),
            Expansion::Names((0..10).map(|i| format!("x[{i}]")).collect())
        );
        assert_eq!(expand("x[0:9]y[0:9]", 99), Expansion::TooLarge);
        assert_eq!(expand("x[0:18446744073709551615]", 10), Expansion::TooLarge);
    }
}
