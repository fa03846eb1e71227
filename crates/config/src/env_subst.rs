/// Replace `${ENV_VAR}` placeholders in config text.
///
/// Unresolvable variables are left as-is so a missing secret surfaces as an
/// obviously unexpanded placeholder instead of an empty string.
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated placeholder, emit literally.
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = &after[..end];
        let resolved = if name.is_empty() { None } else { lookup(name) };
        match resolved {
            Some(value) => out.push_str(&value),
            None => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_var() {
        let lookup = |name: &str| (name == "LAPAK_TEST_VAR").then(|| "sekret".to_string());
        assert_eq!(
            substitute_with("partner_key = \"${LAPAK_TEST_VAR}\"", lookup),
            "partner_key = \"sekret\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        let lookup = |_: &str| None;
        assert_eq!(
            substitute_with("${LAPAK_NO_SUCH_VAR}", lookup),
            "${LAPAK_NO_SUCH_VAR}"
        );
    }

    #[test]
    fn handles_multiple_and_adjacent_placeholders() {
        let lookup = |name: &str| match name {
            "A" => Some("1".to_string()),
            "B" => Some("2".to_string()),
            _ => None,
        };
        assert_eq!(substitute_with("${A}${B}${C}", lookup), "12${C}");
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let lookup = |_: &str| Some("x".to_string());
        assert_eq!(substitute_with("tail ${OOPS", lookup), "tail ${OOPS");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
