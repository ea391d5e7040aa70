//! String normalisation applied to validated fields.

/// Drop control characters, collapse whitespace runs to one space and trim.
///
/// Applying it twice gives the same result as applying it once.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for c in input.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else if !c.is_control() {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn trims_and_collapses() {
        assert_eq!(sanitize("  Fattura \t\n  mensile  "), "Fattura mensile");
    }

    #[test]
    fn strips_nul_and_control_characters() {
        assert_eq!(sanitize("Ordine\u{0}\u{7}123\u{1b}"), "Ordine123");
    }

    #[test]
    fn keeps_accented_text() {
        assert_eq!(sanitize("Attività già svolta"), "Attività già svolta");
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(sanitize(" \t \n"), "");
    }

    proptest! {
        #[test]
        fn idempotent(s in any::<String>()) {
            let once = sanitize(&s);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn output_is_normalised(s in any::<String>()) {
            let out = sanitize(&s);
            prop_assert!(!out.chars().any(char::is_control));
            prop_assert!(!out.contains("  "));
            prop_assert_eq!(out.trim(), out.as_str());
        }
    }
}
