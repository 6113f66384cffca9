use std::error::Error as _;

use insta::assert_snapshot;
use minijinja::{context, render, Environment, ErrorKind, UndefinedBehavior};
use minijinja_simplify::class_names::{split_contents, ClassNames};
use minijinja_simplify::DirectiveSyntaxError;
use similar_asserts::assert_eq;

const LOGIC: &str = r#"test1=True 'test2' "test3" test5=False ring-slate-900/5=True dark:bg-slate-800=True"#;

#[test]
fn test_logic() {
    let env = Environment::new();
    let tokens = split_contents(LOGIC).unwrap();
    let classes = ClassNames::parse(&env, tokens).unwrap();

    assert_eq!(
        classes.render(context! {}).unwrap(),
        "test2 test3 test1 ring-slate-900/5 dark:bg-slate-800"
    );
}

#[test]
fn test_render_is_repeatable() {
    let env = Environment::new();
    let classes = ClassNames::parse(&env, ["'card'", "selected=selected", "muted=not selected"]).unwrap();

    let selected = context! { selected => true };
    let first = classes.render(&selected).unwrap();
    let second = classes.render(&selected).unwrap();
    assert_eq!(first, "card selected");
    assert_eq!(first, second);

    assert_eq!(
        classes.render(context! { selected => false }).unwrap(),
        "card muted"
    );
}

#[test]
fn test_empty() {
    let env = Environment::new();
    let classes = ClassNames::parse(&env, []).unwrap();
    assert!(classes.is_empty());
    assert_eq!(classes.render(context! {}).unwrap(), "");

    let classes = ClassNames::parse(&env, ["a=false", "b=none", "c=0"]).unwrap();
    assert!(!classes.is_empty());
    assert_eq!(classes.render(context! {}).unwrap(), "");
}

#[test]
fn test_duplicate_condition() {
    let env = Environment::new();
    let classes =
        ClassNames::parse(&env, ["active=False", "'btn'", "hidden=True", "active=True"]).unwrap();

    assert_eq!(
        classes.conditional_names().collect::<Vec<_>>(),
        ["active", "hidden"]
    );
    assert_eq!(classes.render(context! {}).unwrap(), "btn active hidden");

    let classes = ClassNames::parse(&env, ["active=True", "active=False"]).unwrap();
    assert_eq!(classes.render(context! {}).unwrap(), "");
}

#[test]
fn test_plus_assignment() {
    let env = Environment::new();
    let classes = ClassNames::parse(&env, ["open+=is_open", "closed=not is_open"]).unwrap();
    assert_eq!(
        classes.render(context! { is_open => true }).unwrap(),
        "open"
    );
}

#[test]
fn test_conditions_use_context() {
    let env = Environment::new();
    let classes = ClassNames::parse(
        &env,
        [
            "'row'",
            "row-error=item.errors",
            "row-odd=index%2==1",
            "row-admin=user.role=='admin'",
        ],
    )
    .unwrap();

    assert_eq!(
        classes
            .render(context! {
                item => context! { errors => vec!["required"] },
                index => 3,
                user => context! { role => "admin" },
            })
            .unwrap(),
        "row row-error row-odd row-admin"
    );
    assert_eq!(
        classes
            .render(context! {
                item => context! { errors => Vec::<String>::new() },
                index => 2,
                user => context! { role => "staff" },
            })
            .unwrap(),
        "row"
    );
}

#[test]
fn test_literals_are_expressions() {
    let env = Environment::new();
    let classes = ClassNames::parse(&env, ["'btn'", "''", "\"\""]).unwrap();
    assert_eq!(classes.render(context! {}).unwrap(), "btn");
}

#[test]
fn test_unsupported_token() {
    let env = Environment::new();
    let err = ClassNames::parse(&env, ["'btn'", "btn-primary"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
    assert_eq!(
        err.to_string(),
        "syntax error: class_names found unsupported token \"btn-primary\""
    );

    let source = err
        .source()
        .and_then(|x| x.downcast_ref::<DirectiveSyntaxError>())
        .unwrap();
    assert_eq!(source.directive(), "class_names");
    assert_eq!(source.token(), "btn-primary");
}

#[test]
fn test_unsupported_token_with_spaces() {
    let env = Environment::new();
    let err = ClassNames::parse(&env, ["not a class"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
}

#[test]
fn test_invalid_expression() {
    let env = Environment::new();
    let err = ClassNames::parse(&env, ["active=(x"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
    assert!(err
        .source()
        .and_then(|x| x.downcast_ref::<DirectiveSyntaxError>())
        .is_none());
}

#[test]
fn test_strict_undefined() {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    let classes = ClassNames::parse(&env, ["active=missing"]).unwrap();
    let err = classes.render(context! {}).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UndefinedError);
}

#[test]
fn test_template_function() {
    let mut env = Environment::new();
    minijinja_simplify::add_to_environment(&mut env);

    assert_snapshot!(render!(in env, r#"<div class="{{ class_names("test1=True", "'test2'", '"test3"', "test5=False ring-slate-900/5=True dark:bg-slate-800=True") }}"></div>"#),
        @r#"<div class="test2 test3 test1 ring-slate-900/5 dark:bg-slate-800"></div>"#);
}

#[test]
fn test_template_function_context() {
    let mut env = Environment::new();
    minijinja_simplify::add_to_environment(&mut env);

    assert_snapshot!(render!(in env, r#"{% for item in items %}{{ class_names("'item' 'px-2'", "item-done=item.done active=item.id==current") }}|{% endfor %}"#,
        items => vec![
            context! { id => 1, done => true },
            context! { id => 2, done => false },
        ],
        current => 2), @"item px-2 item-done|item px-2 active|");
}

#[test]
fn test_template_function_locals() {
    let mut env = Environment::new();
    minijinja_simplify::add_to_environment(&mut env);

    assert_snapshot!(render!(in env, r#"{% set dark = true %}{{ class_names("dark:bg-slate-800=dark", "light=not dark") }}"#), @"dark:bg-slate-800");
}

#[test]
fn test_template_function_conditions_with_spaces() {
    let mut env = Environment::new();
    minijinja_simplify::add_to_environment(&mut env);

    assert_snapshot!(render!(in env, r#"{{ class_names("'btn'", "a=x is defined", "b=y is defined", "muted=not selected") }}"#,
        x => 1), @"btn a muted");
    assert_snapshot!(render!(in env, r#"{{ class_names("light=not dark", "wide=items|length > 1") }}"#,
        dark => false, items => vec![1, 2]), @"light wide");
}

#[test]
fn test_template_function_host_filters() {
    let mut env = Environment::new();
    minijinja_simplify::add_to_environment(&mut env);
    env.add_filter("double", |n: i64| n * 2);

    let err = env
        .render_str(r#"{{ class_names("a=n|double==4") }}"#, context! { n => 2 })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownFilter);

    assert_snapshot!(render!(in env, r#"{% set doubled = n|double %}{{ class_names("a=doubled==4") }}"#,
        n => 2), @"a");
}

#[test]
fn test_template_function_syntax_error() {
    let mut env = Environment::new();
    minijinja_simplify::add_to_environment(&mut env);

    let err = env
        .render_str(r#"{{ class_names("'p-4' rounded") }}"#, context! {})
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);

    let err = env
        .render_str(r#"{{ class_names("'p-4") }}"#, context! {})
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
}
