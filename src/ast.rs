/// A `[start, end)` byte range into the original source text.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A node of a type expression tree.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypeNode {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: TypeKind,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub range: Option<Span>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum TypeKind {
    /// A bare `?`.
    NullableLiteral,
    /// `*`
    AllLiteral,
    NullLiteral,
    UndefinedLiteral,
    VoidLiteral,
    UnionType {
        elements: Vec<TypeNode>,
    },
    ArrayType {
        elements: Vec<TypeNode>,
    },
    /// Every field is a [`TypeKind::FieldType`] node.
    RecordType {
        fields: Vec<TypeNode>,
    },
    FieldType {
        key: String,
        value: Option<Box<TypeNode>>,
    },
    FunctionType {
        params: Vec<TypeNode>,
        result: Option<Box<TypeNode>>,
        #[cfg_attr(feature = "serde", serde(rename = "this"))]
        this_binding: Option<Box<TypeNode>>,
        #[cfg_attr(feature = "serde", serde(rename = "new"))]
        is_new: bool,
    },
    ParameterType {
        name: String,
        expression: Box<TypeNode>,
    },
    RestType {
        expression: Option<Box<TypeNode>>,
    },
    NonNullableType {
        expression: Box<TypeNode>,
        prefix: bool,
    },
    OptionalType {
        expression: Box<TypeNode>,
    },
    NullableType {
        expression: Box<TypeNode>,
        prefix: bool,
    },
    NameExpression {
        name: String,
    },
    TypeApplication {
        expression: Box<TypeNode>,
        applications: Vec<TypeNode>,
    },
    StringLiteralType {
        value: String,
    },
    NumericLiteralType {
        value: f64,
    },
    BooleanLiteralType {
        value: bool,
    },
}

impl TypeNode {
    pub const fn new(kind: TypeKind) -> Self {
        Self { kind, range: None }
    }

    #[must_use]
    pub const fn with_range(mut self, range: Option<Span>) -> Self {
        self.range = range;
        self
    }

    /// Shorthand for a `NameExpression` node.
    pub fn name(name: impl Into<String>) -> Self {
        Self::new(TypeKind::NameExpression { name: name.into() })
    }

    /// `TypeApplication` of `expression` to `applications`, e.g. `Array.<string>`.
    pub fn application(expression: Self, applications: Vec<Self>) -> Self {
        Self::new(TypeKind::TypeApplication {
            expression: Box::new(expression),
            applications,
        })
    }

    pub fn optional(expression: Self) -> Self {
        Self::new(TypeKind::OptionalType {
            expression: Box::new(expression),
        })
    }

    pub fn union(elements: Vec<Self>) -> Self {
        Self::new(TypeKind::UnionType { elements })
    }

    pub fn field(key: impl Into<String>, value: Option<Self>) -> Self {
        Self::new(TypeKind::FieldType {
            key: key.into(),
            value: value.map(Box::new),
        })
    }

    /// The name of a `NameExpression` node.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::NameExpression { name } => Some(name),
            _ => None,
        }
    }

    pub const fn is_optional(&self) -> bool {
        matches!(self.kind, TypeKind::OptionalType { .. })
    }

    /// Applies `f` to the range of this node and of every node below it.
    pub(crate) fn map_ranges(&mut self, f: &mut impl FnMut(Span) -> Span) {
        if let Some(range) = self.range {
            self.range = Some(f(range));
        }
        match &mut self.kind {
            TypeKind::NullableLiteral
            | TypeKind::AllLiteral
            | TypeKind::NullLiteral
            | TypeKind::UndefinedLiteral
            | TypeKind::VoidLiteral
            | TypeKind::NameExpression { .. }
            | TypeKind::StringLiteralType { .. }
            | TypeKind::NumericLiteralType { .. }
            | TypeKind::BooleanLiteralType { .. } => {}
            TypeKind::UnionType { elements } | TypeKind::ArrayType { elements } => {
                elements.iter_mut().for_each(|el| el.map_ranges(f));
            }
            TypeKind::RecordType { fields } => fields.iter_mut().for_each(|el| el.map_ranges(f)),
            TypeKind::FieldType { value, .. } | TypeKind::RestType { expression: value } => {
                if let Some(value) = value {
                    value.map_ranges(f);
                }
            }
            TypeKind::FunctionType {
                params,
                result,
                this_binding,
                ..
            } => {
                if let Some(this_binding) = this_binding {
                    this_binding.map_ranges(f);
                }
                params.iter_mut().for_each(|el| el.map_ranges(f));
                if let Some(result) = result {
                    result.map_ranges(f);
                }
            }
            TypeKind::ParameterType { expression, .. }
            | TypeKind::NonNullableType { expression, .. }
            | TypeKind::OptionalType { expression }
            | TypeKind::NullableType { expression, .. } => expression.map_ranges(f),
            TypeKind::TypeApplication {
                expression,
                applications,
            } => {
                expression.map_ranges(f);
                applications.iter_mut().for_each(|el| el.map_ranges(f));
            }
        }
    }
}

/// One `@title ...` block of a doc comment.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Tag {
    /// The title as written, e.g. `param` or `Returns`.
    pub title: String,
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub ty: Option<TypeNode>,
    pub description: Option<String>,
    /// The `foo` of `[name=foo]`.
    pub default: Option<String>,
    pub caption: Option<String>,
    pub kind: Option<String>,
    pub access: Option<String>,
    pub variation: Option<f64>,
    /// 0-based line of the tag within the (unwrapped) comment.
    pub line_number: Option<usize>,
    pub range: Option<Span>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub errors: Vec<String>,
}

impl Tag {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParsedComment {
    pub description: String,
    pub tags: Vec<Tag>,
}

impl ParsedComment {
    /// Tags with the given title, in source order.
    pub fn tags_titled<'a>(&'a self, title: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags.iter().filter(move |tag| tag.title == title)
    }
}
