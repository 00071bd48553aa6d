//! String literals for generated hook code.
//!
//! Each function returns a complete literal (quotes included) which the target
//! shell's lexer turns back into exactly `raw`.

use workdir_backend::ShellDialect;

#[must_use]
pub fn escape_for_embedding(raw: &str, dialect: ShellDialect) -> String {
    match dialect {
        ShellDialect::Posix => posix_literal(raw),
        ShellDialect::Fish => fish_literal(raw),
        ShellDialect::PowerShell => powershell_literal(raw),
    }
}

/// `'...'`, with each `'` written as `'\''` (close, escaped quote, reopen).
fn posix_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('\'');
    for c in raw.chars() {
        if c == '\'' {
            out.push_str(r"'\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Same quote technique as POSIX. Fish also reads `\\` inside single quotes
/// as one backslash, so backslashes are doubled.
fn fish_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('\'');
    for c in raw.chars() {
        match c {
            '\'' => out.push_str(r"'\''"),
            '\\' => out.push_str(r"\\"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Expandable `"..."` string. Backslash is an ordinary character in
/// PowerShell; the escape character is the backtick.
fn powershell_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '`' => out.push_str("``"),
            '$' => out.push_str("`$"),
            '\n' => out.push_str("`n"),
            '\r' => out.push_str("`r"),
            '\0' => out.push_str("`0"),
            // PowerShell also closes strings on typographic double quotes
            '"' | '\u{201C}' | '\u{201D}' | '\u{201E}' => {
                out.push(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
pub(crate) mod lexers {
    //! Minimal models of each shell's literal lexer, used to check round trips.

    pub fn posix(literal: &str) -> Option<String> {
        let mut out = String::new();
        let mut chars = literal.chars();
        while let Some(c) = chars.next() {
            match c {
                '\'' => loop {
                    match chars.next()? {
                        '\'' => break,
                        inner => out.push(inner),
                    }
                },
                '\\' => out.push(chars.next()?),
                _ => return None,
            }
        }
        Some(out)
    }

    pub fn fish(literal: &str) -> Option<String> {
        let mut out = String::new();
        let mut chars = literal.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\'' => loop {
                    match chars.next()? {
                        '\'' => break,
                        '\\' if matches!(chars.peek(), Some('\\' | '\'')) => {
                            out.push(chars.next()?);
                        }
                        inner => out.push(inner),
                    }
                },
                '\\' => out.push(chars.next()?),
                _ => return None,
            }
        }
        Some(out)
    }

    pub fn powershell(literal: &str) -> Option<String> {
        const DOUBLE_QUOTES: [char; 4] = ['"', '\u{201C}', '\u{201D}', '\u{201E}'];

        let mut chars = literal.chars().peekable();
        if !DOUBLE_QUOTES.contains(&chars.next()?) {
            return None;
        }
        let mut out = String::new();
        loop {
            let c = chars.next()?;
            match c {
                '`' => match chars.next()? {
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    '0' => out.push('\0'),
                    other => out.push(other),
                },
                '$' => return None,
                q if DOUBLE_QUOTES.contains(&q) => {
                    if chars.peek().is_some_and(|next| DOUBLE_QUOTES.contains(next)) {
                        out.push(chars.next()?);
                    } else {
                        return chars.next().is_none().then_some(out);
                    }
                }
                other => out.push(other),
            }
        }
    }
}
