//! Fleet-ID canonicalization.
//!
//! Every fleet comparison in the engine goes through [`canonical_fleet_id`]:
//! hyphens, braces, whitespace, and case differences in a UUID never
//! produce a mismatch.

/// Strip every non-alphanumeric character and lower-case the rest.
pub fn canonical_fleet_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compare two fleet IDs in canonical form. An ID that canonicalizes to
/// the empty string matches nothing.
pub fn same_fleet(a: &str, b: &str) -> bool {
    let a = canonical_fleet_id(a);
    !a.is_empty() && a == canonical_fleet_id(b)
}
