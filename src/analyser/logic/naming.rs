use std::collections::HashSet;

/// Lowercase snake_case form of a header: non-alphanumerics become `_`,
/// runs collapse, ends are trimmed and a leading digit gets a `col_` prefix.
pub fn standardise_column_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();

    let mut result = String::with_capacity(lowered.len());
    let mut last_was_underscore = false;
    for c in lowered.chars() {
        if c.is_alphanumeric() {
            result.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            result.push('_');
            last_was_underscore = true;
        }
    }

    let result = result.trim_matches('_');
    match result.chars().next() {
        None => "col".to_owned(),
        Some(first) if first.is_ascii_digit() => format!("col_{result}"),
        Some(_) => result.to_owned(),
    }
}

/// Standardises every name; collisions get `_1`, `_2`, ... suffixes in
/// column order.
pub fn standardise_column_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(names.len());

    for name in names {
        let base = standardise_column_name(name);
        let mut candidate = base.clone();
        let mut n = 0;
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{base}_{n}");
        }
        seen.insert(candidate.clone());
        cleaned.push(candidate);
    }
    cleaned
}
