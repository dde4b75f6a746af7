//! SQL identifier quoting.
//!
//! Column names produced by name maps are emitted as PostgreSQL quoted identifiers so
//! reserved words (`"order"`, `"user"`) and mixed case survive. Embedded `"` is escaped
//! as `""`.

/// Quote a single identifier part.
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    push_quoted(&mut out, name);
    out
}

pub(crate) fn push_quoted(out: &mut String, name: &str) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
            out.push('"');
        } else {
            out.push(ch);
        }
    }
    out.push('"');
}
