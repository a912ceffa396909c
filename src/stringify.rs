//! Renders a [`TypeNode`] back to type expression syntax.

use std::fmt::{self, Write};

use crate::ast::{TypeKind, TypeNode};
use crate::chars::is_type_name;
use crate::options::StringifyOptions;

/// Renders `node` in canonical type expression syntax.
///
/// # Examples
///
/// ```
/// use jsdoctor::{parse_type, stringify, StringifyOptions, TypeOptions};
///
/// let node = parse_type("Array.<string|number>", TypeOptions::default())?;
/// let text = stringify(&node, StringifyOptions { compact: true, top_level: true });
/// assert_eq!(text, "Array.<(string|number)>");
/// # Ok::<(), jsdoctor::Error>(())
/// ```
pub fn stringify(node: &TypeNode, options: StringifyOptions) -> String {
    let mut out = String::new();
    // Writing into a `String` cannot fail.
    let _ = Stringifier::new(&mut out, options.compact).write(node, options.top_level);
    out
}

impl fmt::Display for TypeNode {
    /// Non-compact, top-level rendering. `{:#}` selects the compact form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compact = f.alternate();
        Stringifier::new(f, compact).write(self, true)
    }
}

struct Stringifier<'w, W> {
    out: &'w mut W,
    compact: bool,
}

impl<'w, W: Write> Stringifier<'w, W> {
    fn new(out: &'w mut W, compact: bool) -> Self {
        Self { out, compact }
    }

    /// `:` or `: `
    fn colon(&mut self) -> fmt::Result {
        self.out.write_str(if self.compact { ":" } else { ": " })
    }

    fn list(&mut self, nodes: &[TypeNode], separator: &str) -> fmt::Result {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                self.out.write_str(separator)?;
            }
            self.write(node, false)?;
        }
        Ok(())
    }

    fn comma_list(&mut self, nodes: &[TypeNode]) -> fmt::Result {
        let separator = if self.compact { "," } else { ", " };
        self.list(nodes, separator)
    }

    fn write(&mut self, node: &TypeNode, top_level: bool) -> fmt::Result {
        match &node.kind {
            TypeKind::NullableLiteral => self.out.write_char('?'),
            TypeKind::AllLiteral => self.out.write_char('*'),
            TypeKind::NullLiteral => self.out.write_str("null"),
            TypeKind::UndefinedLiteral => self.out.write_str("undefined"),
            TypeKind::VoidLiteral => self.out.write_str("void"),
            TypeKind::UnionType { elements } => {
                let separator = if self.compact { "|" } else { " | " };
                if top_level {
                    self.list(elements, separator)
                } else {
                    self.out.write_char('(')?;
                    self.list(elements, separator)?;
                    self.out.write_char(')')
                }
            }
            TypeKind::ArrayType { elements } => {
                self.out.write_char('[')?;
                self.comma_list(elements)?;
                self.out.write_char(']')
            }
            TypeKind::RecordType { fields } => {
                self.out.write_char('{')?;
                self.comma_list(fields)?;
                self.out.write_char('}')
            }
            TypeKind::FieldType { key, value } => {
                if is_plain_key(key) {
                    self.out.write_str(key)?;
                } else {
                    write_quoted(&mut *self.out, key)?;
                }
                if let Some(value) = value {
                    self.colon()?;
                    self.write(value, false)?;
                }
                Ok(())
            }
            TypeKind::FunctionType {
                params,
                result,
                this_binding,
                is_new,
            } => {
                self.out
                    .write_str(if self.compact { "function(" } else { "function (" })?;
                if let Some(this_binding) = this_binding {
                    self.out.write_str(if *is_new { "new" } else { "this" })?;
                    self.colon()?;
                    self.write(this_binding, false)?;
                    if !params.is_empty() {
                        self.out.write_str(if self.compact { "," } else { ", " })?;
                    }
                }
                self.comma_list(params)?;
                self.out.write_char(')')?;
                if let Some(result) = result {
                    self.colon()?;
                    self.write(result, false)?;
                }
                Ok(())
            }
            TypeKind::ParameterType { name, expression } => {
                self.out.write_str(name)?;
                self.colon()?;
                self.write(expression, false)
            }
            TypeKind::RestType { expression } => {
                self.out.write_str("...")?;
                match expression {
                    Some(expression) => self.write(expression, false),
                    None => Ok(()),
                }
            }
            TypeKind::NonNullableType { expression, prefix } => {
                self.affixed('!', expression, *prefix)
            }
            TypeKind::NullableType { expression, prefix } => {
                self.affixed('?', expression, *prefix)
            }
            TypeKind::OptionalType { expression } => {
                self.write(expression, false)?;
                self.out.write_char('=')
            }
            TypeKind::NameExpression { name } => self.out.write_str(name),
            TypeKind::TypeApplication {
                expression,
                applications,
            } => {
                self.write(expression, false)?;
                self.out.write_str(".<")?;
                self.comma_list(applications)?;
                self.out.write_char('>')
            }
            TypeKind::StringLiteralType { value } => write_quoted(&mut *self.out, value),
            TypeKind::NumericLiteralType { value } => write!(self.out, "{}", value),
            TypeKind::BooleanLiteralType { value } => write!(self.out, "{}", value),
        }
    }

    fn affixed(&mut self, marker: char, expression: &TypeNode, prefix: bool) -> fmt::Result {
        if prefix {
            self.out.write_char(marker)?;
            self.write(expression, false)
        } else {
            self.write(expression, false)?;
            self.out.write_char(marker)
        }
    }
}

/// A record key that reads back as a single name or number token.
fn is_plain_key(key: &str) -> bool {
    if key.starts_with(|ch: char| ch.is_ascii_digit()) {
        return key.parse::<f64>().map_or(false, |n| n.to_string() == key);
    }
    !key.is_empty()
        && !key.starts_with(&['"', '\''][..])
        && !key.starts_with('.')
        && !key.ends_with('.')
        && key.chars().all(is_type_name)
}

fn write_quoted(out: &mut impl Write, value: &str) -> fmt::Result {
    out.write_char('"')?;
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                out.write_char('\\')?;
                out.write_char(ch)?;
            }
            '\n' => out.write_str("\\n")?,
            '\r' => out.write_str("\\r")?,
            '\u{2028}' => out.write_str("\\u2028")?,
            '\u{2029}' => out.write_str("\\u2029")?,
            _ => out.write_char(ch)?,
        }
    }
    out.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TypeOptions;
    use crate::types::{parse_param_type, parse_type};

    fn render(source: &str, compact: bool) -> String {
        let node = parse_param_type(source, TypeOptions::default()).unwrap();
        stringify(
            &node,
            StringifyOptions {
                compact,
                top_level: true,
            },
        )
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(render("Array.<string>", false), "Array.<string>");
        assert_eq!(render("string[]", false), "Array.<string>");
        assert_eq!(render("(a|b)", false), "a | b");
        assert_eq!(render("a|b", true), "a|b");
        assert_eq!(render("Array.<a|b>", false), "Array.<(a | b)>");
        assert_eq!(render("{a:number,b}", false), "{a: number, b}");
        assert_eq!(render("{'a b': x}", true), r#"{"a b":x}"#);
        assert_eq!(
            render("function(this:Foo,a:string=):void", false),
            "function (this: Foo, a: string=): void"
        );
        assert_eq!(render("function(new:Foo)", true), "function(new:Foo)");
        assert_eq!(render("[a, ...b]", true), "[a,...b]");
        assert_eq!(render("...number", true), "...number");
        assert_eq!(render("string=", true), "string=");
        assert_eq!(render("?number", true), "?number");
        assert_eq!(render("Object!", true), "Object!");
        assert_eq!(render("'it\\'s'", true), r#""it's""#);
        assert_eq!(render("\"a\\\\b\"", true), r#""a\\b""#);
        assert_eq!(render("0x10", true), "16");
        assert_eq!(render("1.5", true), "1.5");
        assert_eq!(render("*", true), "*");
        assert_eq!(render("?", true), "?");
    }

    #[test]
    fn test_nested_union_is_parenthesized() {
        let node = parse_type("a|b", TypeOptions::default()).unwrap();
        assert_eq!(stringify(&node, StringifyOptions::default()), "(a | b)");
    }

    #[test]
    fn test_display() {
        let node = parse_type("function(a, b): (c|d)", TypeOptions::default()).unwrap();
        assert_eq!(node.to_string(), "function (a, b): (c | d)");
        assert_eq!(format!("{:#}", node), "function(a,b):(c|d)");
    }

    #[test]
    fn test_round_trip() {
        let sources = [
            "Array.<string>",
            "?Object",
            "{a: number, 'b c': [x, ...y], 1: z}",
            "function(this:T, a: string, b: number=): void",
            "function(new:Foo, ...number): !Foo",
            "(string|number|function(): void)",
            "Object.<string, Array.<?>>",
            "module:foo/bar~Baz",
            "'quoted \\\"x\\\"'",
            "1.5e3",
            "true|undefined|null|*",
        ];
        for compact in [false, true].iter().copied() {
            for source in &sources {
                let parsed = parse_type(source, TypeOptions::default()).unwrap();
                let text = stringify(
                    &parsed,
                    StringifyOptions {
                        compact,
                        top_level: true,
                    },
                );
                let reparsed = parse_type(&text, TypeOptions::default()).unwrap();
                assert_eq!(reparsed, parsed, "{} => {}", source, text);
            }
        }
    }
}
