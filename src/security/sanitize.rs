//! Markup sanitization for stored text.
//!
//! Uses ammonia's allow-list cleaner: `<script>` and `<style>` are dropped
//! together with their content, event-handler attributes and `javascript:`
//! URLs disappear, and harmless formatting tags survive. The output of
//! `sanitize` is its own fixed point.
//!
//! A single `ammonia::clean` is not enough for that: mis-nested markup is
//! re-parented by the HTML parser, and the re-serialized tree can parse
//! differently the next time. Cleaning is repeated until the text is stable.

/// Upper bound on cleaning passes; well-formed output settles after one.
const MAX_PASSES: usize = 4;

/// Strip executable markup from `text`.
pub fn sanitize(text: &str) -> String {
    let mut current = ammonia::clean(text);

    for _ in 1..MAX_PASSES {
        let next = ammonia::clean(&current);
        if next == current {
            break;
        }
        current = next;
    }

    current
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    const HOSTILE: &[&str] = &[
        "<script>alert(1)</script>Downtown",
        "<SCRIPT SRC=//evil.example/x.js></SCRIPT>",
        "<img src=x onerror=alert(1)>",
        "<a href=\"javascript:alert(1)\">click</a>",
        "<svg><script>alert(1)</script></svg>",
        "<iframe src=\"//evil.example\"></iframe>Pacific Heights",
        "<<script>script>alert(1)<</script>/script>",
        "<style>body{display:none}</style>Mill Valley",
        "<a><table><a>x</table>",
    ];

    #[test]
    fn removes_script_tag_and_content() {
        assert_eq!(sanitize("<script>alert(1)</script>Downtown"), "Downtown");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(sanitize("Skid Row, Los Angeles"), "Skid Row, Los Angeles");
        assert_eq!(sanitize("06037102107"), "06037102107");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn keeps_safe_formatting() {
        assert_eq!(sanitize("<b>Oakland</b> inner city"), "<b>Oakland</b> inner city");
    }

    #[test]
    fn never_leaves_executable_content() {
        for input in HOSTILE {
            let clean = sanitize(input).to_ascii_lowercase();
            assert!(!clean.contains("<script"), "{input} -> {clean}");
            assert!(!clean.contains("onerror"), "{input} -> {clean}");
            assert!(!clean.contains("javascript:"), "{input} -> {clean}");
            assert!(!clean.contains("<iframe"), "{input} -> {clean}");
            assert!(!clean.contains("<style"), "{input} -> {clean}");
        }
    }

    #[test]
    fn mis_nested_markup_settles() {
        let once = sanitize("<a><table><a>x</table>");

        assert_eq!(sanitize(&once), once);
        assert_eq!(ammonia::clean(&once), once);
    }

    #[test]
    fn is_idempotent() {
        let inputs = HOSTILE
            .iter()
            .copied()
            .chain(["a < b & c > d", "<b>bold</b> <i>it</i>", "Newport Beach"]);

        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input}");
        }
    }
}
