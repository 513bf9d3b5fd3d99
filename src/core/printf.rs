//! The printf-style interpolation mini-language
//!
//! Used in two places: message templates interpolate positional arguments
//! (`%s`, `%d`, `%O`), and formatter templates pull named record fields
//! (`%(name)s`, `%(levelname)s`). Both run through the same single-pass
//! parser, so width and precision modifiers behave identically in each.
//!
//! A token is `%` followed by an optional `(field)` name, an optional `-`
//! alignment flag, an optional width, an optional `.` precision, and a
//! conversion character:
//!
//! - `s` stringify
//! - `d` numeric, rendering `NaN` when the argument is not a number
//! - `O` / `j` JSON, cycle-guarded
//! - `?` JSON for structured values, plain stringification otherwise
//! - `%` a literal percent sign
//!
//! A malformed or unknown token is emitted verbatim rather than failing the
//! log call.

use super::json;
use super::record::Arg;

/// Interpolate positional arguments into a message template.
///
/// Arguments not consumed by the template are appended, space-separated, in
/// their default string form.
pub fn format(template: &str, args: &[Arg]) -> String {
    let mut consumed = 0;
    let mut out = render_inner(template, &|_| None, args, &mut consumed);
    for arg in &args[consumed.min(args.len())..] {
        out.push(' ');
        out.push_str(&arg.to_display());
    }
    out
}

/// Interpolate named fields into a formatter template.
///
/// Fields the lookup cannot resolve render as `undefined`, so a stale
/// template degrades visibly instead of failing.
pub fn render(template: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut consumed = 0;
    render_inner(template, lookup, &[], &mut consumed)
}

struct Token<'a> {
    field: Option<&'a str>,
    left_align: bool,
    width: usize,
    precision: Option<Precision>,
    conversion: char,
}

enum Precision {
    /// `%.Ns` keeps the last N characters
    Tail(usize),
    /// `%.-Ns` keeps the first N characters
    Head(usize),
}

fn render_inner(
    template: &str,
    lookup: &dyn Fn(&str) -> Option<String>,
    args: &[Arg],
    consumed: &mut usize,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let token_start = &rest[pos..];
        match parse_token(token_start) {
            Some((token, token_len)) => {
                if token.conversion == '%' {
                    out.push('%');
                } else {
                    out.push_str(&expand(&token, lookup, args, consumed));
                }
                rest = &token_start[token_len..];
            }
            None => {
                // not a recognizable token: emit up to the next candidate
                let next = token_start[1..]
                    .find('%')
                    .map(|i| i + 1)
                    .unwrap_or(token_start.len());
                out.push_str(&token_start[..next]);
                rest = &token_start[next..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse one token starting at a `%`. Returns the token and its byte length.
fn parse_token(input: &str) -> Option<(Token<'_>, usize)> {
    let bytes = input.as_bytes();
    let mut i = 1;

    if bytes.get(i) == Some(&b'%') {
        return Some((
            Token {
                field: None,
                left_align: false,
                width: 0,
                precision: None,
                conversion: '%',
            },
            i + 1,
        ));
    }

    let mut field = None;
    if bytes.get(i) == Some(&b'(') {
        let close = input[i..].find(')')?;
        field = Some(&input[i + 1..i + close]);
        i += close + 1;
    }

    let mut left_align = false;
    if bytes.get(i) == Some(&b'-') {
        left_align = true;
        i += 1;
    }

    let width_start = i;
    while bytes.get(i).is_some_and(|b| b.is_ascii_digit()) {
        i += 1;
    }
    let width = input[width_start..i].parse().unwrap_or(0);

    let mut precision = None;
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        let head = bytes.get(i) == Some(&b'-');
        if head {
            i += 1;
        }
        let digits_start = i;
        while bytes.get(i).is_some_and(|b| b.is_ascii_digit()) {
            i += 1;
        }
        let count: usize = input[digits_start..i].parse().unwrap_or(0);
        precision = Some(if head {
            Precision::Head(count)
        } else {
            Precision::Tail(count)
        });
    }

    let conversion = input[i..].chars().next()?;
    if !matches!(conversion, 's' | 'd' | 'O' | 'j' | '?') {
        return None;
    }
    i += conversion.len_utf8();

    Some((
        Token {
            field,
            left_align,
            width,
            precision,
            conversion,
        },
        i,
    ))
}

fn expand(
    token: &Token<'_>,
    lookup: &dyn Fn(&str) -> Option<String>,
    args: &[Arg],
    consumed: &mut usize,
) -> String {
    let value = match token.field {
        Some(field) => convert_field(lookup(field), token.conversion),
        None => {
            let arg = args.get(*consumed);
            if arg.is_some() {
                *consumed += 1;
            }
            convert_arg(arg, token.conversion)
        }
    };
    pad(truncate(value, &token.precision), token.width, token.left_align)
}

fn convert_arg(arg: Option<&Arg>, conversion: char) -> String {
    let Some(arg) = arg else {
        return "undefined".to_string();
    };
    match conversion {
        // integers bypass the float path to stay exact at 64 bits
        'd' => match arg {
            Arg::Int(n) => n.to_string(),
            _ => match arg.as_number() {
                Some(n) => render_number(n),
                None => "NaN".to_string(),
            },
        },
        'O' | 'j' => json::stringify(&arg.to_json()),
        '?' => match arg {
            Arg::Json(v) if v.is_object() || v.is_array() => json::stringify(v),
            other => other.to_display(),
        },
        _ => arg.to_display(),
    }
}

fn convert_field(value: Option<String>, conversion: char) -> String {
    let Some(value) = value else {
        return "undefined".to_string();
    };
    match conversion {
        'd' => match value.trim().parse::<f64>() {
            Ok(n) => render_number(n),
            Err(_) => "NaN".to_string(),
        },
        'O' | 'j' => json::stringify(&serde_json::Value::String(value)),
        _ => value,
    }
}

fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9e15 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

fn truncate(value: String, precision: &Option<Precision>) -> String {
    let Some(precision) = precision else {
        return value;
    };
    let chars: Vec<char> = value.chars().collect();
    match *precision {
        Precision::Tail(n) if chars.len() > n => chars[chars.len() - n..].iter().collect(),
        Precision::Head(n) if chars.len() > n => chars[..n].iter().collect(),
        _ => value,
    }
}

fn pad(value: String, width: usize, left_align: bool) -> String {
    let len = value.chars().count();
    if len >= width {
        return value;
    }
    let fill = " ".repeat(width - len);
    if left_align {
        value + &fill
    } else {
        fill + &value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fmt(template: &str, args: Vec<Arg>) -> String {
        format(template, &args)
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(fmt("hello %s", vec![Arg::from("world")]), "hello world");
        assert_eq!(
            fmt("%s and %s", vec![Arg::from("a"), Arg::from("b")]),
            "a and b"
        );
    }

    #[test]
    fn test_numeric_conversion() {
        assert_eq!(fmt("port %d", vec![Arg::from(8080)]), "port 8080");
        assert_eq!(fmt("ratio %d", vec![Arg::from(0.5)]), "ratio 0.5");
        assert_eq!(fmt("count %d", vec![Arg::from("12")]), "count 12");
        assert_eq!(fmt("bad %d", vec![Arg::from("twelve")]), "bad NaN");
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(
            fmt("payload %O", vec![Arg::from(json!({"a": 1}))]),
            r#"payload {"a":1}"#
        );
        assert_eq!(fmt("quoted %j", vec![Arg::from("s")]), r#"quoted "s""#);
    }

    #[test]
    fn test_debug_conversion() {
        assert_eq!(fmt("%?", vec![Arg::from(json!([1, 2]))]), "[1,2]");
        assert_eq!(fmt("%?", vec![Arg::from("plain")]), "plain");
    }

    #[test]
    fn test_percent_literal() {
        assert_eq!(fmt("100%% done", vec![]), "100% done");
    }

    #[test]
    fn test_missing_args_render_undefined() {
        assert_eq!(fmt("%s and %s", vec![Arg::from("one")]), "one and undefined");
    }

    #[test]
    fn test_unknown_token_verbatim() {
        assert_eq!(fmt("50%x off %s", vec![Arg::from("now")]), "50%x off now");
        assert_eq!(fmt("trailing %", vec![]), "trailing %");
    }

    #[test]
    fn test_width_padding() {
        assert_eq!(fmt("%5s", vec![Arg::from("abc")]), "  abc");
        assert_eq!(fmt("%-5s", vec![Arg::from("abc")]), "abc  ");
        assert_eq!(fmt("%2s", vec![Arg::from("abc")]), "abc");
    }

    #[test]
    fn test_precision_truncation() {
        // a bare precision keeps the tail, a negative one keeps the head
        assert_eq!(fmt("%.2s", vec![Arg::from("abc")]), "bc");
        assert_eq!(fmt("%.-2s", vec![Arg::from("abc")]), "ab");
        assert_eq!(fmt("%.5s", vec![Arg::from("abc")]), "abc");
    }

    #[test]
    fn test_width_and_precision_combined() {
        assert_eq!(fmt("%5.2s", vec![Arg::from("abcdef")]), "   ef");
    }

    #[test]
    fn test_leftover_args_appended() {
        assert_eq!(
            fmt("base", vec![Arg::from("x"), Arg::from(3)]),
            "base x 3"
        );
        assert_eq!(
            fmt("%s", vec![Arg::from("used"), Arg::from("extra")]),
            "used extra"
        );
    }

    #[test]
    fn test_named_field_lookup() {
        let out = render("%(name)s.%(levelname)s: %(message)s", &|field| {
            match field {
                "name" => Some("app.db".to_string()),
                "levelname" => Some("INFO".to_string()),
                "message" => Some("connected".to_string()),
                _ => None,
            }
        });
        assert_eq!(out, "app.db.INFO: connected");
    }

    #[test]
    fn test_named_field_unknown_renders_undefined() {
        let out = render("%(nope)s", &|_| None);
        assert_eq!(out, "undefined");
    }

    #[test]
    fn test_named_field_with_width() {
        let out = render("%(levelname)-8s|", &|field| match field {
            "levelname" => Some("WARN".to_string()),
            _ => None,
        });
        assert_eq!(out, "WARN    |");
    }
}
