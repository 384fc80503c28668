//! Text cleanup around translation requests.

/// Normalize text before it is sent: whitespace runs become one space,
/// control characters are dropped and the ends are trimmed.
pub fn clean_text_for_translation(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_persian_char(c: char) -> bool {
    matches!(c, '\u{0600}'..='\u{06FF}' | '\u{200C}')
}

/// Strip commentary from a backend reply.
///
/// When the reply contains Arabic-script runs, only those runs are kept,
/// joined by single spaces. Otherwise the trimmed reply is returned.
pub fn clean_response(response: &str) -> String {
    let mut runs: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in response.chars() {
        if is_persian_char(c) || (c.is_whitespace() && !current.is_empty()) {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    let kept: Vec<String> = runs
        .iter()
        .map(|run| run.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|run| !run.is_empty())
        .collect();
    if kept.is_empty() {
        response.trim().to_string()
    } else {
        kept.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_for_translation() {
        assert_eq!(
            clean_text_for_translation("  Hello\n\tworld  \u{0007}again "),
            "Hello world again"
        );
        assert_eq!(clean_text_for_translation(" \n "), "");
    }

    #[test]
    fn test_clean_response_keeps_persian() {
        let reply = "Here is the translation: سلام دنیا.";
        assert_eq!(clean_response(reply), "سلام دنیا");
    }

    #[test]
    fn test_clean_response_keeps_zwnj() {
        let reply = "می\u{200C}شود";
        assert_eq!(clean_response(reply), "می\u{200C}شود");
    }

    #[test]
    fn test_clean_response_without_persian() {
        assert_eq!(clean_response("  Bonjour le monde \n"), "Bonjour le monde");
    }
}
