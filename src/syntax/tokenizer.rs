//! Bracket-aware splitting of syntax strings.
//!
//! The scanner walks the string once, tracking whether it is outside any bracket,
//! inside a bareword, or inside `<...>`, `[...]` or `(...)`. Spaces only separate
//! fragments outside brackets, so `[optional; Pick one; A|B]` stays whole.

use log::debug;

use crate::syntax::{Fragment, Grammar, SyntaxError, grammar::parse_fragment};

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    Bareword,
    /// Inside a bracket, holding the expected closing character
    Bracket(char),
}

fn closing_for(open: char) -> Option<char> {
    match open {
        '<' => Some('>'),
        '[' => Some(']'),
        '(' => Some(')'),
        _ => None,
    }
}

fn is_closing(c: char) -> bool {
    matches!(c, '>' | ']' | ')')
}

/// Splits a syntax string into its ordered fragments.
///
/// # Errors
///
/// Returns [`SyntaxError::MalformedFragment`] for an unclosed bracket, a closing
/// bracket that does not match the opening one, a bracket opened inside another
/// bracket, or a stray closing bracket.
///
/// # Examples
///
/// ```
/// use slashkit::syntax::split_fragments;
///
/// let fragments = split_fragments("add <item; The item> [count: integer]").unwrap();
/// assert_eq!(fragments, vec!["add", "<item; The item>", "[count: integer]"]);
/// ```
pub fn split_fragments(syntax: &str) -> Result<Vec<String>, SyntaxError> {
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut state = State::Outside;

    for c in syntax.chars() {
        match state {
            State::Outside | State::Bareword => {
                if c.is_whitespace() {
                    if state == State::Bareword {
                        fragments.push(std::mem::take(&mut current));
                    }
                    state = State::Outside;
                } else if let Some(close) = closing_for(c) {
                    if state == State::Bareword {
                        fragments.push(std::mem::take(&mut current));
                    }
                    current.push(c);
                    state = State::Bracket(close);
                } else if is_closing(c) {
                    current.push(c);
                    return Err(SyntaxError::malformed(
                        &current,
                        format!("unexpected `{c}` outside brackets"),
                    ));
                } else {
                    current.push(c);
                    state = State::Bareword;
                }
            }
            State::Bracket(close) => {
                current.push(c);
                if c == close {
                    fragments.push(std::mem::take(&mut current));
                    state = State::Outside;
                } else if closing_for(c).is_some() {
                    return Err(SyntaxError::malformed(
                        &current,
                        format!("`{c}` opened inside another bracket"),
                    ));
                } else if is_closing(c) {
                    return Err(SyntaxError::malformed(
                        &current,
                        format!("`{c}` does not close `{}`", opening_for(close)),
                    ));
                }
            }
        }
    }

    match state {
        State::Bracket(close) => Err(SyntaxError::malformed(
            &current,
            format!("missing closing `{close}`"),
        )),
        State::Bareword => {
            fragments.push(current);
            Ok(fragments)
        }
        State::Outside => Ok(fragments),
    }
}

fn opening_for(close: char) -> char {
    match close {
        '>' => '<',
        ']' => '[',
        _ => '(',
    }
}

/// Tokenizes a syntax string into classified fragments, in order.
///
/// Empty or whitespace-only input yields an empty list.
///
/// # Errors
///
/// Returns [`SyntaxError::MalformedFragment`] when the string cannot be split or
/// when a fragment violates the grammar.
///
/// # Examples
///
/// ```
/// use slashkit::syntax::{Grammar, tokenize};
///
/// let fragments = tokenize("add <item> (-f force)", Grammar::Strict).unwrap();
/// let names: Vec<&str> = fragments.iter().map(|f| f.argument.name.as_str()).collect();
/// assert_eq!(names, vec!["add", "item", "force"]);
/// ```
pub fn tokenize(syntax: &str, grammar: Grammar) -> Result<Vec<Fragment>, SyntaxError> {
    let fragments = split_fragments(syntax)?
        .iter()
        .enumerate()
        .map(|(position, fragment)| parse_fragment(fragment, position, grammar))
        .collect::<Result<Vec<Fragment>, SyntaxError>>()?;

    debug!("tokenized `{}` into {} fragments", syntax, fragments.len());

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ArgumentKind, CommandRole};

    #[test]
    fn test_split_keeps_spaces_inside_brackets() {
        let fragments = split_fragments("<subcmd> <required> [optional; Noob; A|B|C|D]").unwrap();
        assert_eq!(
            fragments,
            vec!["<subcmd>", "<required>", "[optional; Noob; A|B|C|D]"]
        );
    }

    #[test]
    fn test_split_bareword_touching_bracket() {
        let fragments = split_fragments("add<item>").unwrap();
        assert_eq!(fragments, vec!["add", "<item>"]);
    }

    #[test]
    fn test_split_empty_input() {
        assert!(split_fragments("").unwrap().is_empty());
        assert!(split_fragments("   ").unwrap().is_empty());
        assert!(tokenize("", Grammar::Legacy).unwrap().is_empty());
    }

    #[test]
    fn test_split_unclosed_bracket() {
        let result = split_fragments("<required [optional]");
        assert!(matches!(result, Err(SyntaxError::MalformedFragment { .. })));

        let result = split_fragments("<required");
        assert!(matches!(result, Err(SyntaxError::MalformedFragment { .. })));
    }

    #[test]
    fn test_split_mismatched_close() {
        let result = split_fragments("<required]");
        assert!(matches!(result, Err(SyntaxError::MalformedFragment { .. })));
    }

    #[test]
    fn test_split_stray_close() {
        let result = split_fragments("add > <item>");
        assert!(matches!(result, Err(SyntaxError::MalformedFragment { .. })));
    }

    #[test]
    fn test_tokenize_legacy_positions() {
        let fragments = tokenize(
            "anotha;+Another+test+command <req; An argument> [optione; Optional; Choix A|Choix B]",
            Grammar::Legacy,
        )
        .unwrap();

        assert_eq!(fragments.len(), 3);
        assert_eq!(
            fragments[0].argument.kind,
            ArgumentKind::Command(CommandRole::Root)
        );
        assert_eq!(fragments[0].argument.description, "Another test command");
        assert_eq!(fragments[1].argument.name, "req");
        assert_eq!(fragments[1].position, 1);
        assert_eq!(fragments[2].argument.name, "optione");
        assert_eq!(
            fragments[2].choices,
            Some(vec!["Choix A".to_owned(), "Choix B".to_owned()])
        );
    }

    #[test]
    fn test_tokenize_is_deterministic() {
        let syntax = "todo add <item; Item> [count: int] (-q quiet) [tags...]";
        let first = tokenize(syntax, Grammar::Legacy).unwrap();
        let second = tokenize(syntax, Grammar::Legacy).unwrap();
        assert_eq!(first, second);

        let positions: Vec<usize> = first.iter().map(|f| f.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_tokenize_strict_rejects_late_bareword() {
        let result = tokenize("<item> add more", Grammar::Strict);
        assert!(matches!(result, Err(SyntaxError::MalformedFragment { .. })));
    }
}
