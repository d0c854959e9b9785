//! Strips a generic signature's type-parameter declarations down to bare
//! names: `<T extends java.lang.Comparable<T>>` becomes
//! `T`.

/// Extracts the bare names of the type parameters declared by a
/// `<...>`-bracketed generic signature prefix. Returns an empty vector if
/// `signature` does not start with `<`.
#[must_use]
pub fn strip_generic_params(signature: &str) -> Vec<String> {
    let Some(rest) = signature.strip_prefix('<') else {
        return Vec::new();
    };
    let Some(end) = matching_close(rest) else {
        return Vec::new();
    };
    let body = &rest[..end];
    split_top_level(body)
        .into_iter()
        .map(|decl| {
            decl.split_once(" extends ")
                .map_or(decl, |(name, _)| name)
                .trim()
                .to_owned()
        })
        .collect()
}

/// If `s` begins with a `<...>`-bracketed generic parameter declaration,
/// strips it and returns the declared bare names alongside what follows
/// (trimmed). Returns `(vec![], s)` unchanged when `s` does not start with
/// `<` — the common case of a non-generic class or method header.
#[must_use]
pub fn strip_generic_prefix(s: &str) -> (Vec<String>, &str) {
    let Some(rest) = s.strip_prefix('<') else {
        return (Vec::new(), s);
    };
    let Some(end) = matching_close(rest) else {
        return (Vec::new(), s);
    };
    let prefix_end = 1 + end + 1;
    (strip_generic_params(&s[..prefix_end]), s[prefix_end..].trim_start())
}

/// Finds the index of the `>` that closes the `<` implicitly stripped by
/// the caller, accounting for nested angle brackets.
fn matching_close(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits a comma-separated list of type-parameter declarations,
/// respecting nested `<...>` groups.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < s.len() {
        parts.push(s[start..].trim());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bounded_param() {
        assert_eq!(
            strip_generic_params("<T extends java.lang.Comparable<T>>"),
            vec!["T"]
        );
    }

    #[test]
    fn multiple_params() {
        assert_eq!(
            strip_generic_params("<K, V extends java.lang.Object>"),
            vec!["K", "V"]
        );
    }

    #[test]
    fn no_generic_prefix() {
        assert!(strip_generic_params("java.lang.String").is_empty());
    }

    #[test]
    fn strip_generic_prefix_splits_declaration_from_remainder() {
        let (params, rest) = strip_generic_prefix("<T extends java.lang.Comparable<T>> T foo()");
        assert_eq!(params, vec!["T"]);
        assert_eq!(rest, "T foo()");
    }

    #[test]
    fn strip_generic_prefix_leaves_non_generic_text_untouched() {
        let (params, rest) = strip_generic_prefix("Widget extends java.lang.Object");
        assert!(params.is_empty());
        assert_eq!(rest, "Widget extends java.lang.Object");
    }
}
