//! End-to-end compilation tests.

use vellum::{
    CompileError, Compiler, DelimiterKind, FunctionError, Output, Template, TemplateObject, Value,
};

fn render(compiler: &Compiler, source: &str) -> String {
    compiler.render(&Template::new(source)).unwrap()
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

// ============================================================================
// Host objects
// ============================================================================

struct Request {
    path: String,
}

impl TemplateObject for Request {
    fn type_name(&self) -> &str {
        "Request"
    }

    fn get_attr(&self, name: &str) -> Option<Value> {
        (name == "path").then(|| Value::from(self.path.as_str()))
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Option<Result<Value, FunctionError>> {
        match name {
            "is_path" => {
                let prefix = arg(args, 0).to_string();
                Some(Ok(Value::from(self.path.starts_with(&prefix))))
            }
            "fail" => Some(Err(FunctionError::new("request failed"))),
            _ => None,
        }
    }
}

struct ClassWithStaticMethod;

impl TemplateObject for ClassWithStaticMethod {
    fn get_attr(&self, name: &str) -> Option<Value> {
        (name == "VERSION").then(|| Value::from("1.0"))
    }

    fn call_method(&self, name: &str, _args: &[Value]) -> Option<Result<Value, FunctionError>> {
        (name == "foo").then(|| Ok(Value::from("bar")))
    }
}

// ============================================================================
// Output constructs
// ============================================================================

#[test]
fn test_escaped_string() {
    let compiler = Compiler::new();
    assert_eq!(render(&compiler, r#"{{"a&w"}}"#), "a&amp;w");
    assert_eq!(render(&compiler, "{{'a&w'}}"), "a&amp;w");
}

#[test]
fn test_unescaped_string() {
    let compiler = Compiler::new();
    assert_eq!(render(&compiler, r#"{{!"foo"!}}"#), "foo");
    assert_eq!(render(&compiler, "{{!'foo'!}}"), "foo");
    assert_eq!(render(&compiler, r#"{{!"a&w"!}}"#), "a&w");
}

#[test]
fn test_string_literal_with_escaped_quotes() {
    let compiler = Compiler::new();
    assert_eq!(render(&compiler, r"{{'fo\'o'}}"), "fo&#039;o");
    assert_eq!(render(&compiler, r#"{{"fo\"o"}}"#), "fo&quot;o");
    assert_eq!(render(&compiler, r"{{!'fo\'o'!}}"), "fo'o");
    assert_eq!(render(&compiler, r#"{{!"fo\"o"!}}"#), r#"fo"o"#);
}

#[test]
fn test_only_outer_quotes_are_stripped() {
    let compiler = Compiler::new();
    let mut template = Template::new(r#"{{!$foo ? ' class="bar"' : ''!}}"#);
    template.set_var("foo", true);
    assert_eq!(compiler.render(&template).unwrap(), r#" class="bar""#);

    template.set_contents(r#"{{!$foo ? " class='bar'" : ""!}}"#);
    assert_eq!(compiler.render(&template).unwrap(), " class='bar'");
}

#[test]
fn test_escaped_delimiter_with_quotes() {
    assert_eq!(render(&Compiler::new(), r#"\{{" "}}""#), r#"{{" "}}""#);
}

#[test]
fn test_ternary_operator() {
    let compiler = Compiler::new();
    let mut template = Template::new(r#"{{$foo ? "a&w" : ""}}"#);
    template.set_var("foo", true);
    assert_eq!(compiler.render(&template).unwrap(), "a&amp;w");

    template.set_contents(r#"{{!$foo ? "a&w" : ""!}}"#);
    assert_eq!(compiler.render(&template).unwrap(), "a&w");

    template.set_var("foo", false);
    assert_eq!(compiler.render(&template).unwrap(), "");
}

#[test]
fn test_variable_inside_tags() {
    let compiler = Compiler::new();
    let mut template = Template::new("{{$v}}");
    template.set_var("v", "a&w");
    assert_eq!(compiler.render(&template).unwrap(), "a&amp;w");

    template.set_contents("{{!$v!}}");
    assert_eq!(compiler.render(&template).unwrap(), "a&w");
}

#[test]
fn test_array_variable_inside_tags() {
    let compiler = Compiler::new();
    let mut template = Template::new("{{$v[1]}}");
    template.set_var("v", vec!["bar", "a&w"]);
    assert_eq!(compiler.render(&template).unwrap(), "a&amp;w");

    template.set_contents("{{!$v[1]!}}");
    assert_eq!(compiler.render(&template).unwrap(), "a&w");
}

#[test]
fn test_structured_variables() {
    #[derive(serde::Serialize)]
    struct User {
        name: String,
        roles: Vec<String>,
    }

    let mut template = Template::new("{{ $user.name }} ({{ join($user->roles, ', ') }})");
    template.set_var(
        "user",
        Value::from_serialize(&User {
            name: "<dave>".into(),
            roles: vec!["admin".into(), "dev".into()],
        })
        .unwrap(),
    );
    assert_eq!(
        Compiler::new().render(&template).unwrap(),
        "&lt;dave&gt; (admin, dev)"
    );
}

#[test]
fn test_operators() {
    let compiler = Compiler::new();
    assert_eq!(render(&compiler, "{{ 1 + 2 * 3 }}"), "7");
    assert_eq!(render(&compiler, "{{ 'n' ~ (1 + 2) }}"), "n3");
    assert_eq!(render(&compiler, "{{ $missing ?? 'fallback' }}"), "fallback");
    assert_eq!(render(&compiler, "{{ not false and 2 > 1 }}"), "true");
    assert_eq!(render(&compiler, "{{ 10 / 4 }}"), "2.5");
}

#[test]
fn test_type_errors() {
    let compiler = Compiler::new();
    let err = compiler.render(&Template::new("{{ 1 / 0 }}")).unwrap_err();
    assert!(matches!(err, CompileError::TypeError(_)));
    let err = compiler
        .render(&Template::new("{{ [1] < 2 }}"))
        .unwrap_err();
    assert!(matches!(err, CompileError::TypeError(_)));
}

// ============================================================================
// Tags
// ============================================================================

#[test]
fn test_tag_whose_value_is_another_tag() {
    let compiler = Compiler::new();
    let mut template = Template::new("{{!content!}}");
    template.set_tag("message", "world");
    template.set_tag("content", "Hello, {{!message!}}!");
    assert_eq!(compiler.render(&template).unwrap(), "Hello, world!");
}

#[test]
fn test_escaped_tag_whose_value_is_unescaped_tag() {
    let compiler = Compiler::new();
    let mut template = Template::new("{{!content!}}");
    template.set_tag("message", "world");
    template.set_tag("content", "Hello, {{message}}!");
    assert_eq!(compiler.render(&template).unwrap(), "Hello, world!");
}

#[test]
fn test_tag_that_spans_multiple_lines() {
    let mut template = Template::new("{{\n        foo\n        }}");
    template.set_tag("foo", "bar");
    assert_eq!(Compiler::new().render(&template).unwrap(), "bar");
}

#[test]
fn test_tag_with_code_like_value() {
    let mut template = Template::new("{{!foo!}}");
    template.set_tag("foo", "$bar->blah();");
    assert_eq!(Compiler::new().render(&template).unwrap(), "$bar->blah();");
}

#[test]
fn test_tags_take_precedence_over_variables() {
    let mut template = Template::new("{{ name }} {{ $name }}");
    template.set_tag("name", "tag");
    template.set_var("name", "var");
    assert_eq!(Compiler::new().render(&template).unwrap(), "tag var");
}

#[test]
fn test_self_referential_tag_fails() {
    let mut template = Template::new("{{!a!}}");
    template.set_tag("a", "{{!a!}}");
    let err = Compiler::new().render(&template).unwrap_err();
    assert!(matches!(
        err,
        CompileError::RecursionLimitExceeded { ref name, limit: 32 } if name == "a"
    ));
}

#[test]
fn test_mutually_referential_tags_fail() {
    let mut template = Template::new("{{ ping }}");
    template.set_tag("ping", "{{ pong }}");
    template.set_tag("pong", "{{ ping }}");
    let err = Compiler::new().render(&template).unwrap_err();
    assert!(matches!(err, CompileError::RecursionLimitExceeded { .. }));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_template_function() {
    let mut compiler = Compiler::new();
    compiler.register_function("foo", |_: &[Value]| "a&w");
    assert_eq!(render(&compiler, "{{foo()}}"), "a&amp;w");
    assert_eq!(render(&compiler, "{{!foo()!}}"), "a&w");
}

#[test]
fn test_template_function_with_string_input() {
    let mut compiler = Compiler::new();
    compiler.register_function("foo", |args: &[Value]| {
        arg(args, 0).to_string().chars().rev().collect::<String>()
    });
    assert_eq!(render(&compiler, r#"{{!foo("bar")!}}"#), "rab");
}

#[test]
fn test_nested_template_functions() {
    let mut compiler = Compiler::new();
    compiler.register_function("foo", |_: &[Value]| "bar");
    compiler.register_function("baz", |args: &[Value]| {
        arg(args, 0).to_string().chars().rev().collect::<String>()
    });
    assert_eq!(render(&compiler, "{{!baz(foo())!}}"), "rab");
}

#[test]
fn test_nested_builtin_functions() {
    let mut compiler = Compiler::new();
    compiler.register_function("foo", |_: &[Value]| "y");
    assert_eq!(render(&compiler, "{{ upper(foo()) }}"), "Y");
    assert_eq!(render(&compiler, r#"{{!reverse(upper("ab"))!}}"#), "BA");
}

#[test]
fn test_registered_function_shadows_builtin() {
    let mut compiler = Compiler::new();
    compiler.register_function("upper", |_: &[Value]| "mine");
    assert_eq!(render(&compiler, "{{ upper('x') }}"), "mine");
}

#[test]
fn test_function_that_spans_multiple_lines() {
    let mut compiler = Compiler::new();
    compiler.register_function("foo", |args: &[Value]| format!("{}bar", arg(args, 0)));
    let source = "{{\n        foo(\n        'foo'\n        )\n        }}";
    assert_eq!(render(&compiler, source), "foobar");
}

#[test]
fn test_function_with_spaces_between_tags() {
    let mut compiler = Compiler::new();
    compiler.register_emitting_function("foo", |args: &[Value], out: &mut Output| {
        out.write(&arg(args, 0).to_string());
    });
    assert_eq!(render(&compiler, r#"{{! foo("bar") !}}"#), "bar");
}

#[test]
fn test_emitted_text_is_never_escaped() {
    let mut compiler = Compiler::new();
    compiler.register_emitting_function("raw", |_: &[Value], out: &mut Output| {
        out.write("<b>");
    });
    assert_eq!(render(&compiler, "{{ raw() }}"), "<b>");
}

#[test]
fn test_multiple_calls_of_same_function() {
    let mut compiler = Compiler::new();
    compiler.register_function("foo", |args: &[Value]| {
        match (arg(args, 0).is_null(), arg(args, 1).is_null()) {
            (true, true) => "No params",
            (true, false) => "Param 2 set",
            (false, true) => "Param 1 set",
            (false, false) => "Both params set",
        }
    });
    let source =
        r#"{{!foo()!}}, {{!foo()!}}, {{!foo("bar")!}}, {{!foo(null, "bar")!}}, {{!foo("bar", "blah")!}}"#;
    assert_eq!(
        render(&compiler, source),
        "No params, No params, Param 1 set, Param 2 set, Both params set"
    );
}

#[test]
fn test_call_form_wins_over_variable() {
    let mut compiler = Compiler::new();
    compiler.register_function("title", |_: &[Value]| "function");
    let mut template = Template::new("{{ title() }} {{ title }}");
    template.set_var("title", "variable");
    assert_eq!(compiler.render(&template).unwrap(), "function variable");
}

#[test]
fn test_arguments_evaluated_left_to_right() {
    use std::sync::{Arc, Mutex};

    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut compiler = Compiler::new();
    for name in ["a", "b", "c"] {
        let calls = Arc::clone(&calls);
        compiler.register_function(name, move |_: &[Value]| {
            calls.lock().unwrap().push(name);
            name
        });
    }
    compiler.register_function("all", |args: &[Value]| args.len());

    assert_eq!(render(&compiler, "{{ all(a(), b(c())) }}"), "2");
    assert_eq!(*calls.lock().unwrap(), vec!["a", "c", "b"]);
}

#[test]
fn test_invalid_function() {
    let err = Compiler::new()
        .render(&Template::new("{{ foo() }}"))
        .unwrap_err();
    assert!(matches!(err, CompileError::UnknownFunction { ref name } if name == "foo"));
    assert_eq!(err.to_string(), "unknown template function 'foo'");
}

#[test]
fn test_failing_function() {
    let mut compiler = Compiler::new();
    compiler.register_function("fail", |_: &[Value]| {
        Err::<Value, _>(FunctionError::new("boom"))
    });
    let err = compiler.render(&Template::new("{{ fail() }}")).unwrap_err();
    assert_eq!(err.to_string(), "function 'fail' failed: boom");
}

#[test]
fn test_html_helpers() {
    let compiler = Compiler::new();
    assert_eq!(
        render(&compiler, r#"{{! page_title("A & B") !}}"#),
        "<title>A &amp; B</title>"
    );
    assert_eq!(
        render(&compiler, r#"{{! css(["/a.css"]) !}}"#),
        r#"<link href="/a.css" rel="stylesheet">"#
    );
}

// ============================================================================
// Member and static access
// ============================================================================

#[test]
fn test_calling_method_on_variable() {
    let compiler = Compiler::new();
    let mut template = Template::new(
        r#"{{!$request->is_path("/foo/", true) ? ' class="current"' : ""!}}"#,
    );
    template.set_var("request", Value::from_object(Request { path: "/bar".into() }));
    assert_eq!(compiler.render(&template).unwrap(), "");

    template.set_var("request", Value::from_object(Request { path: "/foo/x".into() }));
    assert_eq!(compiler.render(&template).unwrap(), r#" class="current""#);
}

#[test]
fn test_member_access_on_object() {
    let mut template = Template::new("{{ $request->path }}|{{ $request.missing }}|");
    template.set_var("request", Value::from_object(Request { path: "/a&b".into() }));
    assert_eq!(Compiler::new().render(&template).unwrap(), "/a&amp;b||");
}

#[test]
fn test_calling_static_method() {
    let mut compiler = Compiler::new();
    compiler.register_class("ClassWithStaticMethod", ClassWithStaticMethod);
    assert_eq!(
        render(&compiler, r#"{{!ClassWithStaticMethod::foo() == "bar" ? "y" : "n"!}}"#),
        "y"
    );
    assert_eq!(render(&compiler, "{{ ClassWithStaticMethod::VERSION }}"), "1.0");
}

#[test]
fn test_calling_namespaced_static_method() {
    let mut compiler = Compiler::new();
    compiler.register_class("app::views::ClassWithStaticMethod", ClassWithStaticMethod);
    assert_eq!(
        render(&compiler, r#"{{! app::views::ClassWithStaticMethod::foo() == "bar" ? "y" : "n" !}}"#),
        "y"
    );
    assert_eq!(render(&compiler, "{{ app::views::ClassWithStaticMethod::VERSION }}"), "1.0");
}

#[test]
fn test_method_errors() {
    let mut compiler = Compiler::new();
    compiler.register_class("ClassWithStaticMethod", ClassWithStaticMethod);
    let mut template = Template::new("{{ $request->nope() }}");
    template.set_var("request", Value::from_object(Request { path: "/".into() }));

    let err = compiler.render(&template).unwrap_err();
    assert!(matches!(
        err,
        CompileError::UnknownMethod { ref receiver, ref method } if receiver == "Request" && method == "nope"
    ));

    template.set_contents("{{ $request->fail() }}");
    let err = compiler.render(&template).unwrap_err();
    assert!(matches!(err, CompileError::FunctionFailed { .. }));

    template.set_contents("{{ Missing::foo() }}");
    let err = compiler.render(&template).unwrap_err();
    assert!(matches!(err, CompileError::UnknownClass { ref name } if name == "Missing"));

    template.set_contents("{{ $request.path.upper() }}");
    let err = compiler.render(&template).unwrap_err();
    assert!(matches!(err, CompileError::UnknownMethod { .. }));
}

// ============================================================================
// Delimiters
// ============================================================================

fn fixture_template(source: &str) -> (Compiler, Template) {
    let mut compiler = Compiler::new();
    compiler.register_function("customDate", |_: &[Value]| "foo");

    let mut template = Template::new(source);
    template.set_tag("foo", "Hello");
    template.set_tag("bar", "world");
    template.set_tag("imSafe", "a&b");
    template.set_var("today", 1_425_000_000i64);
    (compiler, template)
}

#[test]
fn test_template_with_default_delimiters() {
    let source = concat!(
        r#"{{!foo!}}, {{!bar!}}! \{%show("parttest")%}. \{{!blah!}}. {{imSafe}}. "#,
        r#"{{!"me too"!}}. {{"c&d"}}. {{!"e&f"!}}. \{{"g&h"}}. \{{ "i&j" }}. \{{blah}}. "#,
        r#"Today escaped is {{customDate($today, "m/d/Y")}} and unescaped is "#,
        r#"{{!customDate($today, "m/d/Y")!}}. \{%part("parttest")%}It worked\{%endpart%}."#,
    );
    let (compiler, template) = fixture_template(source);
    assert_eq!(
        compiler.render(&template).unwrap(),
        concat!(
            r#"Hello, world! {%show("parttest")%}. {{!blah!}}. a&amp;b. me too. c&amp;d. e&f. "#,
            r#"{{"g&h"}}. {{ "i&j" }}. {{blah}}. Today escaped is foo and unescaped is foo. "#,
            r#"{%part("parttest")%}It worked{%endpart%}."#,
        )
    );
}

#[test]
fn test_template_with_custom_delimiters() {
    let source = concat!(
        r#"^^foo$$, ^^bar$$! \(*show("parttest")*). \^^blah$$. ++imSafe--. "#,
        r#"^^"me too"$$. ++"c&d"--. ^^"e&f"$$. \++"g&h"--. \++ "i&j" --. \++blah--. "#,
        r#"Today escaped is ++customDate($today, "m/d/Y")-- and unescaped is "#,
        r#"^^customDate($today, "m/d/Y")$$. \(*part("parttest")*)It worked\(*endpart*)."#,
    );
    let (compiler, mut template) = fixture_template(source);
    template
        .set_delimiters(DelimiterKind::UnescapedTag, "^^", "$$")
        .unwrap();
    template
        .set_delimiters(DelimiterKind::EscapedTag, "++", "--")
        .unwrap();
    template
        .set_delimiters(DelimiterKind::Statement, "(*", "*)")
        .unwrap();

    assert_eq!(
        compiler.render(&template).unwrap(),
        concat!(
            r#"Hello, world! (*show("parttest")*). ^^blah$$. a&amp;b. me too. c&amp;d. e&f. "#,
            r#"++"g&h"--. ++ "i&j" --. ++blah--. Today escaped is foo and unescaped is foo. "#,
            r#"(*part("parttest")*)It worked(*endpart*)."#,
        )
    );
}

#[test]
fn test_default_markers_inert_after_reconfiguration() {
    let mut template = Template::new("{{ $x }} [[ $x ]]");
    template
        .set_delimiters(DelimiterKind::EscapedTag, "[[", "]]")
        .unwrap();
    template.set_var("x", "y");
    assert_eq!(Compiler::new().render(&template).unwrap(), "{{ $x }} y");
}

#[test]
fn test_open_marker_equal_to_another_close_marker_rejected() {
    let mut template = Template::new("{{ $x }} and }} tail %}");
    let err = template
        .set_delimiters(DelimiterKind::Statement, "}}", "%}")
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidDelimiters(_)));

    template.set_var("x", "y");
    assert_eq!(Compiler::new().render(&template).unwrap(), "y and }} tail %}");
}

#[test]
fn test_compiler_template_uses_configured_delimiters() {
    let config = vellum::CompilerConfig::from_yaml(
        "delimiters:\n  escaped: { open: \"<%=\", close: \"%>\" }\n",
    )
    .unwrap();
    let compiler = Compiler::new().with_config(config).unwrap();
    let mut template = compiler.template("<%= $x %>");
    template.set_var("x", "&");
    assert_eq!(compiler.render(&template).unwrap(), "&amp;");
}

// ============================================================================
// Errors and modes
// ============================================================================

#[test]
fn test_unterminated_construct_reports_position() {
    let err = Compiler::new()
        .render(&Template::new("line one\n  {{ foo"))
        .unwrap_err();
    assert!(matches!(err, CompileError::UnterminatedConstruct(_)));
    assert_eq!(err.to_string(), "unterminated escaped tag at line 2, column 3");
}

#[test]
fn test_malformed_expression() {
    let err = Compiler::new()
        .render(&Template::new("{{ foo('bar' }}"))
        .unwrap_err();
    assert!(matches!(err, CompileError::MalformedExpression { .. }));
}

#[test]
fn test_deeply_nested_expression_fails_cleanly() {
    let compiler = Compiler::new();
    for source in [
        format!("{{{{ {}1{} }}}}", "(".repeat(5000), ")".repeat(5000)),
        format!("{{{{ {}$x }}}}", "!".repeat(5000)),
        format!("{{{{ {} }}}}", vec!["1"; 5000].join(" + ")),
    ] {
        let err = compiler.render(&Template::new(source)).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MalformedExpression { ref message, .. } if message == "expression nested too deeply"
        ));
    }

    let nested = vellum::expr::MAX_NESTING / 2;
    let source = format!("{{{{ {}1{} }}}}", "(".repeat(nested), ")".repeat(nested));
    assert_eq!(render(&compiler, &source), "1");
}

#[test]
fn test_no_partial_output_on_failure() {
    let result = Compiler::new().render(&Template::new("lots of text {{ nope() }}"));
    assert!(result.is_err());
}

#[test]
fn test_strict_mode_rejects_undefined_names() {
    let compiler = Compiler::new()
        .with_config(vellum::CompilerConfig::default().strict())
        .unwrap();
    let err = compiler.render(&Template::new("{{ $who }}")).unwrap_err();
    assert_eq!(err.to_string(), "'who' is neither a tag nor a variable");

    let lenient = Compiler::new();
    assert_eq!(render(&lenient, "[{{ $who }}]"), "[]");
}

#[test]
fn test_compiles_concurrently() {
    let mut compiler = Compiler::new();
    compiler.register_function("double", |args: &[Value]| {
        arg(args, 0).as_number().map(|n| n.to_f64() * 2.0).unwrap_or_default()
    });

    std::thread::scope(|scope| {
        for i in 0..4 {
            let compiler = &compiler;
            scope.spawn(move || {
                let mut template = Template::new("{{ double($n) }}");
                template.set_var("n", i);
                assert_eq!(compiler.render(&template).unwrap(), (i * 2).to_string());
            });
        }
    });
}
