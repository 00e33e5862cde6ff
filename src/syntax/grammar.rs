//! Classification of a single syntax fragment.
//!
//! Each fragment is one of four shapes: `<required>`, `[optional]`, `(-flag name)`
//! or a bareword. Bracketed fragments carry a payload of the form
//! `name[: datatype][; description[; a|b|c]]`.

use log::debug;

use crate::{
    command::{Argument, ArgumentKind, CommandRole, DataType},
    syntax::{Grammar, SyntaxError},
};

/// Description placeholder used when a payload carries none.
pub const BLANK_DESCRIPTION: &str = " ";

const VARIADIC_SUFFIX: &str = "...";

/// Decoded `name; description; choices` payload of a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Name part, possibly still carrying a `: datatype` suffix
    pub head: String,
    /// Description, [`BLANK_DESCRIPTION`] when absent
    pub description: String,
    /// Literal choices, `None` when absent
    pub choices: Option<Vec<String>>,
}

impl Payload {
    /// Returns `true` when the payload carried a real description.
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

/// One classified fragment of a syntax string.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// 0-based position in the fragment sequence
    pub position: usize,
    /// Fragment text as written
    pub source: String,
    pub argument: Argument,
    /// Literal choices declared in the payload
    pub choices: Option<Vec<String>>,
}

/// Decodes a fragment payload.
///
/// `+` becomes a space, then the payload is split on `"; "`: the first part is the
/// head, the second the description and the third a `|`-delimited choice list.
///
/// # Examples
///
/// ```
/// use slashkit::syntax::decode_payload;
///
/// let payload = decode_payload("optional; Noob; A|B|C+D");
/// assert_eq!(payload.head, "optional");
/// assert_eq!(payload.description, "Noob");
/// assert_eq!(payload.choices, Some(vec!["A".into(), "B".into(), "C D".into()]));
/// ```
pub fn decode_payload(payload: &str) -> Payload {
    let decoded = payload.replace('+', " ");
    let mut parts = decoded.split("; ");

    let head = parts.next().unwrap_or_default().trim().to_owned();
    let description = match parts.next().map(str::trim) {
        Some(description) if !description.is_empty() => description.to_owned(),
        _ => BLANK_DESCRIPTION.to_owned(),
    };
    let choices = parts.next().map(|choices| {
        choices
            .split('|')
            .map(str::trim)
            .filter(|choice| !choice.is_empty())
            .map(str::to_owned)
            .collect()
    });

    Payload {
        head,
        description,
        choices,
    }
}

/// Encodes a payload so that [`decode_payload`] yields it back.
///
/// Spaces are written as `+` so the result is a single whitespace-free word,
/// usable both inside brackets and as a bareword. A literal `+` cannot survive
/// the round trip.
pub fn encode_payload(head: &str, description: Option<&str>, choices: Option<&[String]>) -> String {
    let mut encoded = head.to_owned();

    let description = description.filter(|description| !description.trim().is_empty());
    if description.is_some() || choices.is_some() {
        encoded.push_str("; ");
        encoded.push_str(description.unwrap_or(BLANK_DESCRIPTION));
    }
    if let Some(choices) = choices {
        encoded.push_str("; ");
        encoded.push_str(&choices.join("|"));
    }

    encoded.replace(' ', "+")
}

/// Classifies and parses one fragment.
///
/// # Arguments
///
/// * `fragment` - Fragment text, e.g. `<name; A name>` or `add`
/// * `position` - 0-based position of the fragment in its syntax string
/// * `grammar` - Position rules for barewords
///
/// # Errors
///
/// Returns [`SyntaxError::MalformedFragment`] when a bracket is not closed by its
/// matching bracket, when a name is empty or contains spaces, when a datatype is
/// unknown, or when a bareword appears at a position the grammar forbids.
pub fn parse_fragment(
    fragment: &str,
    position: usize,
    grammar: Grammar,
) -> Result<Fragment, SyntaxError> {
    let (argument, choices) = match fragment.chars().next() {
        Some('<') => parse_positional(fragment, '>', false)?,
        Some('[') => parse_positional(fragment, ']', true)?,
        Some('(') => parse_flag(fragment)?,
        Some(_) => (parse_bareword(fragment, position, grammar)?, None),
        None => return Err(SyntaxError::malformed(fragment, "empty fragment")),
    };

    debug!(
        "parsed fragment {} `{}` as {:?} `{}`",
        position, fragment, argument.kind, argument.name
    );

    Ok(Fragment {
        position,
        source: fragment.to_owned(),
        argument,
        choices,
    })
}

/// Returns the payload between the opening bracket and `close`.
fn bracket_inner(fragment: &str, close: char) -> Result<&str, SyntaxError> {
    if fragment.len() < 2 || !fragment.ends_with(close) {
        return Err(SyntaxError::malformed(
            fragment,
            format!("missing closing `{close}`"),
        ));
    }
    Ok(&fragment[1..fragment.len() - 1])
}

/// Checks that a name is non-empty and a single word.
fn check_name(fragment: &str, name: &str) -> Result<(), SyntaxError> {
    if name.is_empty() {
        return Err(SyntaxError::malformed(fragment, "missing name"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(SyntaxError::malformed(
            fragment,
            format!("name `{name}` contains whitespace"),
        ));
    }
    Ok(())
}

/// Strips a trailing `...` marker, returning whether it was present.
fn strip_variadic(text: &str) -> (&str, bool) {
    match text.trim_end().strip_suffix(VARIADIC_SUFFIX) {
        Some(stripped) => (stripped, true),
        None => (text, false),
    }
}

fn parse_positional(
    fragment: &str,
    close: char,
    optional: bool,
) -> Result<(Argument, Option<Vec<String>>), SyntaxError> {
    let inner = bracket_inner(fragment, close)?;
    // `<words; Some words...>` and `<words...; Some words>` are both variadic
    let (inner, trailing_variadic) = strip_variadic(inner);
    let payload = decode_payload(inner);
    let (head, head_variadic) = strip_variadic(&payload.head);

    let (name, datatype) = match head.split_once(':') {
        Some((name, datatype)) => {
            let datatype = DataType::parse(datatype).ok_or_else(|| {
                SyntaxError::malformed(fragment, format!("unknown datatype `{}`", datatype.trim()))
            })?;
            (name.trim(), datatype)
        }
        None => (head.trim(), DataType::String),
    };
    check_name(fragment, name)?;

    let argument = Argument {
        kind: ArgumentKind::Positional,
        name: name.to_owned(),
        description: payload.description.clone(),
        optional,
        variadic: trailing_variadic || head_variadic,
        datatype,
        flag_token: None,
        min: None,
        max: None,
        subarguments: Vec::new(),
    };

    Ok((argument, payload.choices))
}

fn parse_flag(fragment: &str) -> Result<(Argument, Option<Vec<String>>), SyntaxError> {
    if !fragment.starts_with("(-") {
        return Err(SyntaxError::malformed(fragment, "flags must start with `(-`"));
    }
    let inner = bracket_inner(fragment, ')')?;
    let payload = decode_payload(inner);

    let mut words = payload.head.split_whitespace();
    let token = words.next().unwrap_or_default();
    let rest: Vec<&str> = words.collect();

    let name = match rest.as_slice() {
        [] => token.trim_start_matches('-'),
        [name] => *name,
        _ => {
            return Err(SyntaxError::malformed(
                fragment,
                "a flag binds exactly one name",
            ));
        }
    };
    check_name(fragment, name)?;
    if token.trim_start_matches('-').is_empty() {
        return Err(SyntaxError::malformed(fragment, "missing flag token"));
    }
    if name.ends_with(VARIADIC_SUFFIX) {
        return Err(SyntaxError::malformed(fragment, "flags cannot be variadic"));
    }

    let argument = Argument {
        kind: ArgumentKind::Flag,
        name: name.to_owned(),
        description: payload.description.clone(),
        optional: true,
        variadic: false,
        datatype: DataType::String,
        flag_token: Some(token.to_owned()),
        min: None,
        max: None,
        subarguments: Vec::new(),
    };

    Ok((argument, payload.choices))
}

fn parse_bareword(
    fragment: &str,
    position: usize,
    grammar: Grammar,
) -> Result<Argument, SyntaxError> {
    if let Some(close) = fragment.chars().find(|c| matches!(c, '>' | ']' | ')')) {
        return Err(SyntaxError::malformed(
            fragment,
            format!("unexpected `{close}` outside brackets"),
        ));
    }

    let role = match grammar {
        Grammar::Legacy => match position {
            0 => CommandRole::Root,
            1 => CommandRole::Group,
            _ => CommandRole::Sub,
        },
        Grammar::Strict if position > 1 => {
            return Err(SyntaxError::malformed(
                fragment,
                "subgroups and subcommands can only be used as the first two fragments",
            ));
        }
        Grammar::Strict => CommandRole::Sub,
    };

    let payload = decode_payload(fragment);
    check_name(fragment, &payload.head)?;

    Ok(Argument {
        kind: ArgumentKind::Command(role),
        name: payload.head,
        description: payload.description,
        optional: false,
        variadic: false,
        datatype: DataType::String,
        flag_token: None,
        min: None,
        max: None,
        subarguments: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_positional() {
        let fragment = parse_fragment("<required>", 0, Grammar::Strict).unwrap();
        assert_eq!(fragment.argument.kind, ArgumentKind::Positional);
        assert_eq!(fragment.argument.name, "required");
        assert!(!fragment.argument.optional);
        assert!(!fragment.argument.variadic);
        assert_eq!(fragment.argument.datatype, DataType::String);
        assert_eq!(fragment.argument.description, BLANK_DESCRIPTION);
        assert!(fragment.choices.is_none());
    }

    #[test]
    fn test_optional_with_description_and_choices() {
        let fragment = parse_fragment("[optional; Noob; A|B|C|D]", 2, Grammar::Legacy).unwrap();
        assert!(fragment.argument.optional);
        assert_eq!(fragment.argument.name, "optional");
        assert_eq!(fragment.argument.description, "Noob");
        assert_eq!(
            fragment.choices,
            Some(vec!["A".into(), "B".into(), "C".into(), "D".into()])
        );
    }

    #[test]
    fn test_typed_positional() {
        let fragment = parse_fragment("<count: integer>", 0, Grammar::Strict).unwrap();
        assert_eq!(fragment.argument.name, "count");
        assert_eq!(fragment.argument.datatype, DataType::Integer);
    }

    #[test]
    fn test_unknown_datatype() {
        let result = parse_fragment("<count: emoji>", 0, Grammar::Strict);
        assert!(matches!(result, Err(SyntaxError::MalformedFragment { .. })));
    }

    #[test]
    fn test_variadic_forms() {
        let required = parse_fragment("<words...>", 0, Grammar::Legacy).unwrap();
        assert!(required.argument.variadic);
        assert_eq!(required.argument.name, "words");

        let optional = parse_fragment("[rest...; Everything else]", 0, Grammar::Legacy).unwrap();
        assert!(optional.argument.variadic);
        assert!(optional.argument.optional);
        assert_eq!(optional.argument.name, "rest");
        assert_eq!(optional.argument.description, "Everything else");

        let trailing = parse_fragment("<words; Some words...>", 0, Grammar::Legacy).unwrap();
        assert!(trailing.argument.variadic);
        assert_eq!(trailing.argument.description, "Some words");
    }

    #[test]
    fn test_flag() {
        let fragment = parse_fragment("(-f force; Skip checks)", 3, Grammar::Strict).unwrap();
        assert_eq!(fragment.argument.kind, ArgumentKind::Flag);
        assert_eq!(fragment.argument.name, "force");
        assert_eq!(fragment.argument.flag_token.as_deref(), Some("-f"));
        assert_eq!(fragment.argument.description, "Skip checks");
        assert!(fragment.argument.optional);
    }

    #[test]
    fn test_flag_without_name_binds_token() {
        let fragment = parse_fragment("(--verbose)", 0, Grammar::Strict).unwrap();
        assert_eq!(fragment.argument.name, "verbose");
        assert_eq!(fragment.argument.flag_token.as_deref(), Some("--verbose"));
    }

    #[test]
    fn test_paren_without_dash() {
        let result = parse_fragment("(force)", 0, Grammar::Strict);
        assert!(matches!(result, Err(SyntaxError::MalformedFragment { .. })));
    }

    #[test]
    fn test_unclosed_brackets() {
        for fragment in ["<name", "[name", "(-f name", "<name]"] {
            let result = parse_fragment(fragment, 0, Grammar::Strict);
            assert!(
                matches!(result, Err(SyntaxError::MalformedFragment { .. })),
                "{fragment} should be malformed"
            );
        }
    }

    #[test]
    fn test_bareword_roles_legacy() {
        let root = parse_fragment("testy;+A+test+command", 0, Grammar::Legacy).unwrap();
        assert_eq!(root.argument.kind, ArgumentKind::Command(CommandRole::Root));
        assert_eq!(root.argument.name, "testy");
        assert_eq!(root.argument.description, "A test command");

        let group = parse_fragment("group", 1, Grammar::Legacy).unwrap();
        assert_eq!(group.argument.kind, ArgumentKind::Command(CommandRole::Group));

        let sub = parse_fragment("sub", 5, Grammar::Legacy).unwrap();
        assert_eq!(sub.argument.kind, ArgumentKind::Command(CommandRole::Sub));
    }

    #[test]
    fn test_bareword_position_strict() {
        assert!(parse_fragment("add", 0, Grammar::Strict).is_ok());
        assert!(parse_fragment("add", 1, Grammar::Strict).is_ok());
        assert!(matches!(
            parse_fragment("add", 2, Grammar::Strict),
            Err(SyntaxError::MalformedFragment { .. })
        ));
    }

    #[test]
    fn test_name_with_space_is_malformed() {
        let result = parse_fragment("<two words>", 0, Grammar::Strict);
        assert!(matches!(result, Err(SyntaxError::MalformedFragment { .. })));
    }

    #[test]
    fn test_payload_round_trip_name_only() {
        for name in ["required", "optional", "game_id", "x"] {
            let encoded = encode_payload(name, None, None);
            assert_eq!(decode_payload(&encoded).head, name);
        }
    }

    #[test]
    fn test_payload_round_trip_full() {
        let choices = vec!["Choice A".to_owned(), "Choice B".to_owned()];
        let encoded = encode_payload("opt", Some("Pick one"), Some(&choices));
        assert_eq!(encoded, "opt;+Pick+one;+Choice+A|Choice+B");

        let payload = decode_payload(&encoded);
        assert_eq!(payload.head, "opt");
        assert_eq!(payload.description, "Pick one");
        assert_eq!(payload.choices, Some(choices));
    }

    #[test]
    fn test_payload_round_trip_choices_without_description() {
        let choices = vec!["a".to_owned(), "b".to_owned()];
        let payload = decode_payload(&encode_payload("opt", None, Some(&choices)));
        assert_eq!(payload.head, "opt");
        assert!(!payload.has_description());
        assert_eq!(payload.choices, Some(choices));
    }

    #[test]
    fn test_payload_without_description() {
        let payload = decode_payload("name");
        assert_eq!(payload.description, BLANK_DESCRIPTION);
        assert!(!payload.has_description());
        assert!(payload.choices.is_none());
    }
}
