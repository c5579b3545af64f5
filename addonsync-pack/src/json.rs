//! Comment-tolerant JSON input.
//!
//! Hand-authored manifests frequently carry `//` and `/* */` comments.
//! They are removed here, outside string literals, before the text is
//! handed to `serde_json`. Line structure is preserved so parse errors
//! still point at the right line.

/// Returns `text` with comments outside string literals removed.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_line_and_block_comments() {
        let input = "{\n  // name\n  \"a\": 1, /* inline */ \"b\": 2\n}";
        assert_eq!(strip_comments(input), "{\n  \n  \"a\": 1,  \"b\": 2\n}");
    }

    #[test]
    fn keeps_comment_markers_inside_strings() {
        let input = r#"{"url": "https://example.com/a", "glob": "/* not */"}"#;
        assert_eq!(strip_comments(input), input);
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let input = r#"{"s": "say \"//hi\""} // tail"#;
        assert_eq!(strip_comments(input), r#"{"s": "say \"//hi\""} "#);
    }

    #[test]
    fn block_comment_keeps_line_count() {
        let input = "/* a\nb\nc */{}";
        assert_eq!(strip_comments(input), "\n\n{}");
    }

    #[test]
    fn unterminated_block_comment_swallows_rest() {
        assert_eq!(strip_comments("{} /* open"), "{} ");
    }
}
