/// Derive the short name used to identify a thing on the hub side.
///
/// Keeps ASCII alphanumerics and underscores, drops everything else, so
/// `"is Abstract"` becomes `"isAbstract"` and `"Block-A (v2)"` becomes
/// `"BlockAv2"`. The same input always yields the same output. An input with
/// no retained characters falls back to the trimmed input.
pub fn short_name(name: &str) -> String {
    let derived: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if derived.is_empty() {
        name.trim().to_string()
    } else {
        derived
    }
}

/// Whether a candidate (name, short name) pair matches the wanted pair.
///
/// Short names are compared first, then full names, both ignoring ASCII case.
pub fn names_match(
    candidate_name: &str,
    candidate_short_name: &str,
    name: &str,
    short_name: &str,
) -> bool {
    (!short_name.is_empty() && candidate_short_name.eq_ignore_ascii_case(short_name))
        || (!name.is_empty() && candidate_name.eq_ignore_ascii_case(name))
}

/// Whether a value is empty or whitespace only.
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
