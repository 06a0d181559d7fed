use crate::binder::{Scanner, line_break_len};

/// Split a script into statements on every `;` that is immediately followed by a line break.
///
/// Fragments are trimmed and empty ones dropped. The separating `;` is consumed; a trailing
/// `;` with no line break after it stays on the last fragment. Semicolons inside quoted
/// strings, quoted identifiers and comments never split.
///
/// ```rust
/// use sql_bridge::split_statements;
///
/// let parts = split_statements("CREATE TABLE a(id INT);\nCREATE TABLE b(id INT);");
/// assert_eq!(parts, vec!["CREATE TABLE a(id INT)", "CREATE TABLE b(id INT);"]);
/// ```
#[must_use]
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut scanner = Scanner::new(sql);
    let bytes = scanner.bytes();
    let mut statements = Vec::new();
    let mut start = 0;

    while let Some(idx) = scanner.next_code() {
        if bytes[idx] != b';' {
            continue;
        }
        let brk = line_break_len(bytes, idx + 1);
        if brk == 0 {
            continue;
        }
        push_fragment(&mut statements, &sql[start..idx]);
        start = idx + 1 + brk;
        scanner.skip_to(start);
    }
    push_fragment(&mut statements, &sql[start..]);
    statements
}

fn push_fragment(statements: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolon_newline() {
        let parts = split_statements("CREATE TABLE a(id INT);\nCREATE TABLE b(id INT);");
        assert_eq!(parts, vec!["CREATE TABLE a(id INT)", "CREATE TABLE b(id INT);"]);
    }

    #[test]
    fn keeps_same_line_statements_together() {
        let parts = split_statements("INSERT INTO a VALUES (1); INSERT INTO a VALUES (2)");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn handles_crlf_and_blank_fragments() {
        let parts = split_statements("DROP TABLE a;\r\n\r\n;\nDROP TABLE b;\r\n");
        assert_eq!(parts, vec!["DROP TABLE a", "DROP TABLE b"]);
    }

    #[test]
    fn ignores_semicolons_in_literals_and_comments() {
        let sql = "INSERT INTO t VALUES ('a;\nb');\n-- note;\nSELECT 1;\n";
        let parts = split_statements(sql);
        assert_eq!(
            parts,
            vec!["INSERT INTO t VALUES ('a;\nb')", "-- note;\nSELECT 1"]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split_statements("  \n ").is_empty());
    }
}
