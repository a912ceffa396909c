use jsdoctor::ast::{Span, Tag, TypeKind, TypeNode};
use jsdoctor::{
    parse, parse_param_type, parse_type, stringify, Error, ErrorPolicy, ParseOptions,
    StringifyOptions, TypeOptions,
};

fn unwrapped() -> ParseOptions {
    ParseOptions {
        unwrap: true,
        ..ParseOptions::default()
    }
}

#[test]
fn test_function_with_full_doc_comment() {
    let source = r#"/**
     * Fetches a user.
     *
     * Second paragraph.
     *
     * @param {string} id - The user id.
     * @param {{timeout: number, retries: (number|undefined)}} [options] Request options.
     * @param {...*} rest
     * @returns {Promise.<?User>} The user, if any.
     * @throws {NotFoundError}
     * @example <caption>Basic</caption>
     * fetchUser('42');
     */"#;
    let comment = parse(
        source,
        &ParseOptions {
            unwrap: true,
            sloppy: true,
            ..ParseOptions::default()
        },
    )
    .unwrap();

    assert_eq!(comment.description, "Fetches a user.\n\nSecond paragraph.");
    let titles: Vec<_> = comment.tags.iter().map(|tag| tag.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["param", "param", "param", "returns", "throws", "example"]
    );

    let options = &comment.tags[1];
    assert_eq!(options.name.as_deref(), Some("options"));
    assert!(options.ty.as_ref().unwrap().is_optional());
    assert_eq!(options.description.as_deref(), Some("Request options."));

    let rest = &comment.tags[2];
    assert_eq!(
        rest.ty,
        Some(TypeNode::new(TypeKind::RestType {
            expression: Some(Box::new(TypeNode::new(TypeKind::AllLiteral)))
        }))
    );

    let returns = &comment.tags[3];
    assert_eq!(
        stringify(returns.ty.as_ref().unwrap(), StringifyOptions::default()),
        "Promise.<?User>"
    );

    let example = &comment.tags[5];
    assert_eq!(example.caption.as_deref(), Some("Basic"));
    assert_eq!(example.description.as_deref(), Some("fetchUser('42');"));
}

#[test]
fn test_recoverable_and_strict_access() {
    let source = "/** @access weird */";

    let comment = parse(
        source,
        &ParseOptions {
            policy: ErrorPolicy::from_flags(false, true),
            ..unwrapped()
        },
    )
    .unwrap();
    assert_eq!(
        comment.tags,
        vec![Tag {
            access: Some("weird".to_owned()),
            errors: vec!["Invalid access name 'weird'".to_owned()],
            ..Tag::new("access")
        }]
    );

    let err = parse(
        source,
        &ParseOptions {
            policy: ErrorPolicy::from_flags(true, false),
            ..unwrapped()
        },
    )
    .unwrap_err();
    assert_eq!(err, Error::InvalidAccess("weird".to_owned()));
}

#[test]
fn test_array_forms_are_equivalent() {
    assert_eq!(
        parse_type("Array.<string>", TypeOptions::default()),
        parse_type("string[]", TypeOptions::default())
    );
}

#[test]
fn test_stringify_round_trip() {
    let compact = StringifyOptions {
        compact: true,
        top_level: true,
    };
    for source in &[
        "(string|number)",
        "{a: number, b: string}",
        "function(a: string, b: number=): void",
        "?Array.<!Object>",
        "[number, ...string]",
    ] {
        let parsed = parse_type(source, TypeOptions::default()).unwrap();
        let printed = stringify(&parsed, compact);
        assert_eq!(parse_type(&printed, TypeOptions::default()).unwrap(), parsed);
    }
    assert_eq!(
        stringify(
            &parse_type("(string|number)", TypeOptions::default()).unwrap(),
            compact
        ),
        "string|number"
    );
}

#[test]
fn test_type_ranges_with_offset() {
    let node = parse_param_type(
        "...number",
        TypeOptions {
            range: true,
            start_index: 4,
        },
    )
    .unwrap();
    assert_eq!(node.range, Some(Span::new(4, 13)));
}

#[test]
fn test_blocks_parse_in_parallel() {
    let blocks: Vec<String> = (0..8)
        .map(|i| format!("/**\n * @param {{Array.<T{}>}} p{}\n */", i, i))
        .collect();
    let handles: Vec<_> = blocks
        .into_iter()
        .map(|block| std::thread::spawn(move || parse(&block, &unwrapped())))
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let comment = handle.join().unwrap().unwrap();
        assert_eq!(comment.tags[0].name, Some(format!("p{}", i)));
    }
}

#[cfg(feature = "serde")]
#[test]
fn test_serialized_shape() {
    let comment = parse("@param {?string} name", &ParseOptions::default()).unwrap();
    let json = serde_json::to_value(&comment).unwrap();
    assert_eq!(
        json["tags"][0]["type"],
        serde_json::json!({
            "type": "NullableType",
            "expression": { "type": "NameExpression", "name": "string" },
            "prefix": true
        })
    );
    assert_eq!(json["tags"][0]["name"], "name");
}
