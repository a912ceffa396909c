//! Recursive-descent parser for Closure-Compiler-style type expressions.
//!
//! ```text
//! top        := expr ( '|' expr )*
//! expr       := ( '?' | '!' ) basic | basic ( '!' | '?' | '[' ']' )?
//! basic      := '*' | '(' union ')' | '[' elements ']' | '{' fields '}'
//!             | name-or-function | string | number
//! ```

use tracing::trace;

use crate::ast::{Span, TypeKind, TypeNode};
use crate::error::{Error, Result};
use crate::options::TypeOptions;
use crate::scanner::{Scanner, TokenKind, TokenValue};

/// Deepest nesting of type expressions accepted before giving up.
pub const MAX_DEPTH: usize = 128;

/// Result of a midstream parse: the expression and where it stopped.
#[derive(Clone, Debug, PartialEq)]
pub struct Midstream {
    pub expression: TypeNode,
    /// Byte offset just past the last token that belongs to `expression`.
    pub index: usize,
}

pub(crate) struct TypeParser<'a> {
    scanner: Scanner<'a>,
    options: TypeOptions,
    depth: usize,
}

impl<'a> TypeParser<'a> {
    pub(crate) fn new(source: &'a str, options: TypeOptions) -> Result<Self> {
        Ok(Self {
            scanner: Scanner::new(source)?,
            options,
            depth: 0,
        })
    }

    #[inline]
    fn token(&self) -> TokenKind {
        self.scanner.kind()
    }

    #[inline]
    fn position(&self) -> usize {
        self.scanner.token().start
    }

    fn next(&mut self) -> Result<()> {
        self.scanner.advance().map(|_| ())
    }

    /// Consumes a token the caller has already checked.
    fn consume(&mut self, kind: TokenKind) -> Result<()> {
        debug_assert_eq!(self.token(), kind, "consumed token not matched");
        self.next()
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.token() != kind {
            return Err(self.unexpected());
        }
        self.next()
    }

    fn unexpected(&self) -> Error {
        let position = self.position();
        if self.token() == TokenKind::Eof {
            Error::UnexpectedEndOfInput { position }
        } else {
            Error::unexpected(position, "unexpected token")
        }
    }

    /// Range from `start` to the end of the last consumed token, if ranges are wanted.
    fn span(&self, start: usize) -> Option<Span> {
        if self.options.range {
            let offset = self.options.start_index;
            Some(Span::new(start + offset, self.scanner.previous_end() + offset))
        } else {
            None
        }
    }

    fn node(&self, kind: TypeKind, start: usize) -> TypeNode {
        TypeNode::new(kind).with_range(self.span(start))
    }

    fn take_text(&mut self) -> Result<String> {
        let token = self.scanner.advance()?;
        match token.value {
            TokenValue::Text(text) => Ok(text),
            TokenValue::Number(value) => Ok(value.to_string()),
            TokenValue::None => Err(Error::unexpected(token.start, "unexpected token")),
        }
    }

    /// `A`, or a bare union `A|B|C`.
    pub(crate) fn parse_top(&mut self) -> Result<TypeNode> {
        let start = self.position();
        let expr = self.parse_type_expression()?;
        if self.token() != TokenKind::Pipe {
            return Ok(expr);
        }

        let mut elements = vec![expr];
        while self.token() == TokenKind::Pipe {
            self.consume(TokenKind::Pipe)?;
            elements.push(self.parse_type_expression()?);
        }
        Ok(self.node(TypeKind::UnionType { elements }, start))
    }

    /// Like [`parse_top`](Self::parse_top) but also accepts `...T` and `T=`.
    pub(crate) fn parse_top_param(&mut self) -> Result<TypeNode> {
        let start = self.position();
        if self.token() == TokenKind::Rest {
            self.consume(TokenKind::Rest)?;
            let expression = self.parse_top()?;
            return Ok(self.node(
                TypeKind::RestType {
                    expression: Some(Box::new(expression)),
                },
                start,
            ));
        }

        let expr = self.parse_top()?;
        if self.token() == TokenKind::Equal {
            self.consume(TokenKind::Equal)?;
            return Ok(self.node(
                TypeKind::OptionalType {
                    expression: Box::new(expr),
                },
                start,
            ));
        }
        Ok(expr)
    }

    fn parse_type_expression(&mut self) -> Result<TypeNode> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::TooDeeplyNested { limit: MAX_DEPTH });
        }
        self.depth += 1;
        let result = self.parse_type_expression_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_expression_inner(&mut self) -> Result<TypeNode> {
        let start = self.position();

        match self.token() {
            TokenKind::Question => {
                self.consume(TokenKind::Question)?;
                if matches!(
                    self.token(),
                    TokenKind::Comma
                        | TokenKind::Equal
                        | TokenKind::RBrace
                        | TokenKind::RParen
                        | TokenKind::Pipe
                        | TokenKind::Eof
                        | TokenKind::RBrack
                        | TokenKind::Gt
                ) {
                    return Ok(self.node(TypeKind::NullableLiteral, start));
                }
                let expression = Box::new(self.parse_basic_type_expression()?);
                return Ok(self.node(
                    TypeKind::NullableType {
                        expression,
                        prefix: true,
                    },
                    start,
                ));
            }
            TokenKind::Bang => {
                self.consume(TokenKind::Bang)?;
                let expression = Box::new(self.parse_basic_type_expression()?);
                return Ok(self.node(
                    TypeKind::NonNullableType {
                        expression,
                        prefix: true,
                    },
                    start,
                ));
            }
            _ => {}
        }

        let expr = self.parse_basic_type_expression()?;
        match self.token() {
            TokenKind::Bang => {
                self.consume(TokenKind::Bang)?;
                Ok(self.node(
                    TypeKind::NonNullableType {
                        expression: Box::new(expr),
                        prefix: false,
                    },
                    start,
                ))
            }
            TokenKind::Question => {
                self.consume(TokenKind::Question)?;
                Ok(self.node(
                    TypeKind::NullableType {
                        expression: Box::new(expr),
                        prefix: false,
                    },
                    start,
                ))
            }
            TokenKind::LBrack => {
                self.consume(TokenKind::LBrack)?;
                if self.token() != TokenKind::RBrack {
                    return Err(Error::unexpected(
                        self.position(),
                        "expected an array-style type declaration (T[])",
                    ));
                }
                self.consume(TokenKind::RBrack)?;
                let array = TypeNode::name("Array");
                Ok(self.node(
                    TypeKind::TypeApplication {
                        expression: Box::new(array),
                        applications: vec![expr],
                    },
                    start,
                ))
            }
            _ => Ok(expr),
        }
    }

    fn parse_basic_type_expression(&mut self) -> Result<TypeNode> {
        let start = self.position();
        match self.token() {
            TokenKind::Star => {
                self.consume(TokenKind::Star)?;
                Ok(self.node(TypeKind::AllLiteral, start))
            }
            TokenKind::LParen => self.parse_union_type(),
            TokenKind::LBrack => self.parse_array_type(),
            TokenKind::LBrace => self.parse_record_type(),
            TokenKind::Name => self.parse_name_like(),
            TokenKind::String => {
                let value = self.take_text()?;
                Ok(self.node(TypeKind::StringLiteralType { value }, start))
            }
            TokenKind::Number => match self.scanner.advance()?.value {
                TokenValue::Number(value) => {
                    Ok(self.node(TypeKind::NumericLiteralType { value }, start))
                }
                _ => Err(Error::unexpected(start, "unexpected token")),
            },
            _ => Err(self.unexpected()),
        }
    }

    fn parse_name_like(&mut self) -> Result<TypeNode> {
        let start = self.position();
        let token = self.scanner.token();
        let is_function = token.is_name("function");
        let literal = match token.text() {
            Some("null") => Some(TypeKind::NullLiteral),
            Some("undefined") => Some(TypeKind::UndefinedLiteral),
            Some("true") => Some(TypeKind::BooleanLiteralType { value: true }),
            Some("false") => Some(TypeKind::BooleanLiteralType { value: false }),
            _ => None,
        };
        if let Some(kind) = literal {
            self.consume(TokenKind::Name)?;
            return Ok(self.node(kind, start));
        }

        if is_function {
            let snapshot = self.scanner.snapshot();
            let depth = self.depth;
            match self.parse_function_type() {
                Ok(node) => return Ok(node),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    trace!(%err, "not a function type, reading `function` as a name");
                    self.scanner.restore(snapshot);
                    self.depth = depth;
                }
            }
        }
        self.parse_type_name()
    }

    fn parse_name_expression(&mut self) -> Result<TypeNode> {
        let start = self.position();
        if self.token() != TokenKind::Name {
            return Err(self.unexpected());
        }
        let mut name = self.take_text()?;
        if self.token() == TokenKind::Colon
            && matches!(name.as_str(), "module" | "external" | "event")
        {
            self.consume(TokenKind::Colon)?;
            if self.token() != TokenKind::Name {
                return Err(self.unexpected());
            }
            name.push(':');
            name.push_str(&self.take_text()?);
        }
        Ok(self.node(TypeKind::NameExpression { name }, start))
    }

    /// A name, optionally applied to type arguments: `Object.<string, number>`.
    fn parse_type_name(&mut self) -> Result<TypeNode> {
        let start = self.position();
        let expr = self.parse_name_expression()?;
        if !matches!(self.token(), TokenKind::DotLt | TokenKind::Lt) {
            return Ok(expr);
        }
        self.next()?;
        let mut applications = vec![self.parse_top()?];
        while self.token() == TokenKind::Comma {
            self.consume(TokenKind::Comma)?;
            applications.push(self.parse_top()?);
        }
        self.expect(TokenKind::Gt)?;
        Ok(self.node(
            TypeKind::TypeApplication {
                expression: Box::new(expr),
                applications,
            },
            start,
        ))
    }

    fn parse_union_type(&mut self) -> Result<TypeNode> {
        let start = self.position();
        self.consume(TokenKind::LParen)?;
        if self.token() == TokenKind::RParen {
            return Err(Error::unexpected(self.position(), "empty union type"));
        }
        let mut elements = Vec::new();
        loop {
            elements.push(self.parse_type_expression()?);
            if self.token() == TokenKind::RParen {
                break;
            }
            self.expect(TokenKind::Pipe)?;
        }
        self.consume(TokenKind::RParen)?;
        Ok(self.node(TypeKind::UnionType { elements }, start))
    }

    /// `[A, B, ...C]`
    fn parse_array_type(&mut self) -> Result<TypeNode> {
        let start = self.position();
        self.consume(TokenKind::LBrack)?;
        let mut elements = Vec::new();
        while self.token() != TokenKind::RBrack {
            if self.token() == TokenKind::Rest {
                let rest_start = self.position();
                self.consume(TokenKind::Rest)?;
                let expression = self.parse_type_expression()?;
                elements.push(self.node(
                    TypeKind::RestType {
                        expression: Some(Box::new(expression)),
                    },
                    rest_start,
                ));
                break;
            }
            elements.push(self.parse_type_expression()?);
            if self.token() != TokenKind::RBrack {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RBrack)?;
        Ok(self.node(TypeKind::ArrayType { elements }, start))
    }

    fn parse_record_type(&mut self) -> Result<TypeNode> {
        let start = self.position();
        self.consume(TokenKind::LBrace)?;
        let fields = self.parse_record_fields().map_err(|err| match err {
            Error::UnexpectedEndOfInput { .. } => Error::UnbalancedBraces,
            other => other,
        })?;
        Ok(self.node(TypeKind::RecordType { fields }, start))
    }

    fn parse_record_fields(&mut self) -> Result<Vec<TypeNode>> {
        let mut fields = Vec::new();
        if self.token() == TokenKind::Comma {
            self.consume(TokenKind::Comma)?;
        } else {
            while self.token() != TokenKind::RBrace {
                fields.push(self.parse_field_type()?);
                if self.token() != TokenKind::RBrace {
                    self.expect(TokenKind::Comma)?;
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(fields)
    }

    fn parse_field_type(&mut self) -> Result<TypeNode> {
        let start = self.position();
        let key = match self.token() {
            TokenKind::Name | TokenKind::String | TokenKind::Number => self.take_text()?,
            _ => return Err(self.unexpected()),
        };
        let value = if self.token() == TokenKind::Colon {
            self.consume(TokenKind::Colon)?;
            Some(Box::new(self.parse_type_expression()?))
        } else {
            None
        };
        Ok(self.node(TypeKind::FieldType { key, value }, start))
    }

    fn parse_function_type(&mut self) -> Result<TypeNode> {
        let start = self.position();
        self.consume(TokenKind::Name)?;
        self.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        let mut this_binding = None;
        let mut is_new = false;
        if self.token() != TokenKind::RParen {
            let binding = self.scanner.token();
            if binding.is_name("this") || binding.is_name("new") {
                is_new = binding.is_name("new");
                self.consume(TokenKind::Name)?;
                self.expect(TokenKind::Colon)?;
                this_binding = Some(Box::new(self.parse_type_name()?));
                if self.token() == TokenKind::Comma {
                    self.consume(TokenKind::Comma)?;
                    params = self.parse_parameters_type()?;
                }
            } else {
                params = self.parse_parameters_type()?;
            }
        }
        self.expect(TokenKind::RParen)?;

        let result = if self.token() == TokenKind::Colon {
            Some(Box::new(self.parse_result_type()?))
        } else {
            None
        };
        Ok(self.node(
            TypeKind::FunctionType {
                params,
                result,
                this_binding,
                is_new,
            },
            start,
        ))
    }

    fn parse_result_type(&mut self) -> Result<TypeNode> {
        self.consume(TokenKind::Colon)?;
        let start = self.position();
        if self.scanner.token().is_name("void") {
            self.consume(TokenKind::Name)?;
            return Ok(self.node(TypeKind::VoidLiteral, start));
        }
        self.parse_type_expression()
    }

    /// Parameters up to, not including, the closing `)`.
    fn parse_parameters_type(&mut self) -> Result<Vec<TypeNode>> {
        let mut params = Vec::new();
        let mut optional_sequence = false;

        while self.token() != TokenKind::RParen {
            let start = self.position();
            let rest = self.token() == TokenKind::Rest;
            if rest {
                self.consume(TokenKind::Rest)?;
            }

            let mut expr = self.parse_type_expression()?;
            if self.token() == TokenKind::Colon {
                if let TypeKind::NameExpression { name } = &expr.kind {
                    let name = name.clone();
                    self.consume(TokenKind::Colon)?;
                    let expression = Box::new(self.parse_type_expression()?);
                    expr = self.node(TypeKind::ParameterType { name, expression }, start);
                }
            }

            if self.token() == TokenKind::Equal {
                self.consume(TokenKind::Equal)?;
                expr = self.node(
                    TypeKind::OptionalType {
                        expression: Box::new(expr),
                    },
                    start,
                );
                optional_sequence = true;
            } else if optional_sequence {
                return Err(Error::InvalidOptionalSequence { position: start });
            }

            if rest {
                expr = self.node(
                    TypeKind::RestType {
                        expression: Some(Box::new(expr)),
                    },
                    start,
                );
            }
            params.push(expr);
            if self.token() != TokenKind::RParen {
                self.expect(TokenKind::Comma)?;
            }
        }
        Ok(params)
    }

    fn finish(self, expression: TypeNode) -> Result<TypeNode> {
        if self.token() != TokenKind::Eof {
            return Err(Error::NotAtEndOfInput {
                position: self.position(),
            });
        }
        Ok(expression)
    }

    fn midstream(self, expression: TypeNode) -> Midstream {
        Midstream {
            expression,
            index: self.scanner.previous_end(),
        }
    }
}

/// Parses a complete type expression such as `Array.<string>|null`.
///
/// # Errors
///
/// Returns an error if `source` is not a valid type expression or has trailing content.
pub fn parse_type(source: &str, options: TypeOptions) -> Result<TypeNode> {
    let mut parser = TypeParser::new(source, options)?;
    let expression = parser.parse_top()?;
    parser.finish(expression)
}

/// Parses a type in parameter position, which may also be `...T` or `T=`.
///
/// # Errors
///
/// Returns an error if `source` is not a valid parameter type or has trailing content.
pub fn parse_param_type(source: &str, options: TypeOptions) -> Result<TypeNode> {
    let mut parser = TypeParser::new(source, options)?;
    let expression = parser.parse_top_param()?;
    parser.finish(expression)
}

/// Parses a type expression at the start of `source` and reports where it ended.
///
/// # Errors
///
/// Returns an error if no type expression can be read.
pub fn parse_type_midstream(source: &str, options: TypeOptions) -> Result<Midstream> {
    let mut parser = TypeParser::new(source, options)?;
    let expression = parser.parse_top()?;
    Ok(parser.midstream(expression))
}

/// Midstream variant of [`parse_param_type`].
///
/// # Errors
///
/// Returns an error if no parameter type can be read.
pub fn parse_param_type_midstream(source: &str, options: TypeOptions) -> Result<Midstream> {
    let mut parser = TypeParser::new(source, options)?;
    let expression = parser.parse_top_param()?;
    Ok(parser.midstream(expression))
}
