use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated placeholder starting at byte {offset}")] Unterminated { offset: usize },
    #[error("empty placeholder at byte {offset}")] EmptyName { offset: usize },
    #[error("invalid placeholder name '{name}' at byte {offset}")] InvalidName { offset: usize, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a base prompt into literal runs and `{name}` placeholders.
///
/// `{{` and `}}` stand for literal braces; a lone `}` is kept as text.
pub fn parse(src: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let bytes = src.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                if start < i {
                    segments.push(Segment::Literal(&src[start..i]));
                }
                segments.push(Segment::Literal(&src[i..i + 1]));
                i += 2;
                start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                if start < i {
                    segments.push(Segment::Literal(&src[start..i]));
                }
                segments.push(Segment::Literal(&src[i..i + 1]));
                i += 2;
                start = i;
            }
            b'{' => {
                let close = src[i + 1..]
                    .find(|c: char| c == '}' || c == '{')
                    .map(|rel| i + 1 + rel)
                    .filter(|&end| bytes[end] == b'}')
                    .ok_or(TemplateError::Unterminated { offset: i })?;
                let name = &src[i + 1..close];
                if name.is_empty() {
                    return Err(TemplateError::EmptyName { offset: i });
                }
                if !valid_name(name) {
                    return Err(TemplateError::InvalidName { offset: i, name: name.to_string() });
                }
                if start < i {
                    segments.push(Segment::Literal(&src[start..i]));
                }
                segments.push(Segment::Placeholder(name));
                i = close + 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < src.len() {
        segments.push(Segment::Literal(&src[start..]));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Segment::*;

    #[test]
    fn splits_literals_and_placeholders() {
        let segs = parse("a {x} b {y_2}").unwrap();
        assert_eq!(segs, vec![Literal("a "), Placeholder("x"), Literal(" b "), Placeholder("y_2")]);
    }

    #[test]
    fn doubled_braces_are_literal() {
        let segs = parse("{{x}} }").unwrap();
        assert_eq!(segs, vec![Literal("{"), Literal("x"), Literal("}"), Literal(" }")]);
    }

    #[test]
    fn reports_offsets_for_malformed_placeholders() {
        assert_eq!(parse("abc {open"), Err(TemplateError::Unterminated { offset: 4 }));
        assert_eq!(parse("{a {b}"), Err(TemplateError::Unterminated { offset: 0 }));
        assert_eq!(parse("x{}"), Err(TemplateError::EmptyName { offset: 1 }));
        assert_eq!(
            parse("{tipo chocolate}"),
            Err(TemplateError::InvalidName { offset: 0, name: "tipo chocolate".into() })
        );
    }

    #[test]
    fn non_ascii_literals_survive() {
        let segs = parse("Cenário {estrutura} é").unwrap();
        assert_eq!(segs, vec![Literal("Cenário "), Placeholder("estrutura"), Literal(" é")]);
    }
}
