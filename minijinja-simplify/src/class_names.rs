#[cfg(test)]
use similar_asserts::assert_eq;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use minijinja::value::{Rest, Value};
use minijinja::{Environment, Error, ErrorKind, Expression, State, UndefinedBehavior};
use serde::Serialize;

use crate::error::DirectiveSyntaxError;

/// The name the directive reports in syntax errors.
pub const DIRECTIVE_NAME: &str = "class_names";

/// A single parsed directive token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `name=expr` or `name+=expr`: include `name` if `expr` is true.
    Assignment {
        /// The class name, used verbatim.
        name: &'a str,
        /// The source of the condition.
        value: &'a str,
    },
    /// A quoted literal that is always included.
    Literal {
        /// The source of the literal including its quotes.
        value: &'a str,
    },
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '/' | ':' | '@' | '-')
}

fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

fn parse_assignment(token: &str) -> Option<Token<'_>> {
    let name_end = token.find(|c: char| !is_name_char(c))?;
    if name_end == 0 {
        return None;
    }
    let (name, rest) = token.split_at(name_end);
    let value = rest
        .strip_prefix("+=")
        .or_else(|| rest.strip_prefix('='))?;
    if value.is_empty() {
        return None;
    }
    Some(Token::Assignment { name, value })
}

fn parse_literal(token: &str) -> Option<Token<'_>> {
    let quote = token.chars().next().filter(|&c| is_quote(c))?;
    let inner = token[1..].strip_suffix(quote)?;
    if inner.contains(is_quote) {
        return None;
    }
    Some(Token::Literal { value: token })
}

/// Parses a single directive token.
///
/// The assignment form is tried first and only if that does not match is
/// the token considered a quoted literal.  Returns `None` if neither form
/// matches.
///
/// ```
/// use minijinja_simplify::class_names::{parse_token, Token};
///
/// assert_eq!(
///     parse_token("ring-slate-900/5=True"),
///     Some(Token::Assignment { name: "ring-slate-900/5", value: "True" })
/// );
/// assert_eq!(parse_token("'p-4'"), Some(Token::Literal { value: "'p-4'" }));
/// assert_eq!(parse_token("p-4"), None);
/// ```
pub fn parse_token(token: &str) -> Option<Token<'_>> {
    parse_assignment(token).or_else(|| parse_literal(token))
}

/// Splits directive arguments on whitespace.
///
/// Quoted runs are kept together with their quotes, so `'a b'` stays a
/// single token, as does `active="a b"`.  A backslash inside quotes
/// escapes the following character.  An unterminated quote is a syntax
/// error.
///
/// ```
/// use minijinja_simplify::class_names::split_contents;
///
/// let tokens = split_contents(r#"p-4 'm-2 rounded' dark:bg-slate-800=dark"#).unwrap();
/// assert_eq!(tokens, ["p-4", "'m-2 rounded'", "dark:bg-slate-800=dark"]);
/// ```
pub fn split_contents(source: &str) -> Result<Vec<&str>, Error> {
    let mut rv = Vec::new();
    let mut chars = source.char_indices().peekable();

    loop {
        while let Some((_, c)) = chars.peek() {
            if !c.is_whitespace() {
                break;
            }
            chars.next();
        }
        let start = match chars.peek() {
            Some(&(idx, _)) => idx,
            None => break,
        };

        let mut end = source.len();
        while let Some((idx, c)) = chars.next() {
            if c.is_whitespace() {
                end = idx;
                break;
            }
            if is_quote(c) {
                let mut closed = false;
                while let Some((_, inner)) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == c {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(
                        DirectiveSyntaxError::unclosed_quote(DIRECTIVE_NAME, &source[start..])
                            .into(),
                    );
                }
            }
        }
        rv.push(&source[start..end]);
    }

    Ok(rv)
}

/// A parsed `class_names` directive.
///
/// The directive is parsed once from its tokens and can then be rendered
/// any number of times against different contexts.  Tokens come in two
/// forms:
///
/// * `name=expr` (or `name+=expr`): `name` is emitted if `expr` evaluates
///   to a true value.  If the same name is given more than once the last
///   expression wins.
/// * `'literal'` or `"literal"`: always emitted.
///
/// Literals come first in the output, followed by the names of all true
/// conditions, both in the order in which they were written.
///
/// ```
/// use minijinja::{context, Environment};
/// use minijinja_simplify::class_names::ClassNames;
///
/// let env = Environment::new();
/// let classes = ClassNames::parse(&env, ["'btn'", "btn-active=active", "disabled=locked"]).unwrap();
/// assert_eq!(classes.render(context!(active => true)).unwrap(), "btn btn-active");
/// ```
#[derive(Debug)]
pub struct ClassNames<'env, 'source> {
    literals: Vec<Expression<'env, 'source>>,
    conditions: IndexMap<&'source str, Expression<'env, 'source>>,
    undefined_behavior: UndefinedBehavior,
}

impl<'env, 'source> ClassNames<'env, 'source> {
    /// Parses the directive's tokens and compiles their expressions.
    ///
    /// Fails with a syntax error if a token has neither form or if one of
    /// the expressions does not compile.
    pub fn parse<I>(env: &'env Environment<'source>, tokens: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'source str>,
    {
        let mut literals = Vec::new();
        let mut conditions = IndexMap::new();

        for token in tokens {
            match parse_token(token) {
                Some(Token::Assignment { name, value }) => {
                    conditions.insert(name, env.compile_expression(value)?);
                }
                Some(Token::Literal { value }) => {
                    literals.push(env.compile_expression(value)?);
                }
                None => {
                    return Err(DirectiveSyntaxError::unsupported_token(DIRECTIVE_NAME, token).into())
                }
            }
        }

        Ok(ClassNames {
            literals,
            conditions,
            undefined_behavior: env.undefined_behavior(),
        })
    }

    /// Returns `true` if the directive has no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.conditions.is_empty()
    }

    /// Iterates over the conditional class names in output order.
    pub fn conditional_names(&self) -> impl Iterator<Item = &'source str> + '_ {
        self.conditions.keys().copied()
    }

    /// Renders the class string against a context.
    ///
    /// Literals that evaluate to an empty string, `none` or undefined are
    /// skipped.  Errors from evaluating an expression are passed through.
    /// With [`UndefinedBehavior::Strict`] an expression that evaluates to
    /// undefined is an error.
    pub fn render<S: Serialize>(&self, ctx: S) -> Result<String, Error> {
        let ctx = Value::from_serialize(&ctx);
        let mut rv = Vec::with_capacity(self.literals.len() + self.conditions.len());

        for expr in &self.literals {
            let value = self.eval(expr, &ctx)?;
            if value.is_undefined() || value.is_none() {
                continue;
            }
            let class = value.to_string();
            if !class.is_empty() {
                rv.push(class);
            }
        }

        for (name, expr) in &self.conditions {
            if self.eval(expr, &ctx)?.is_true() {
                rv.push(name.to_string());
            }
        }

        Ok(rv.join(" "))
    }

    fn eval(&self, expr: &Expression<'env, 'source>, ctx: &Value) -> Result<Value, Error> {
        let value = expr.eval(ctx)?;
        if value.is_undefined() && matches!(self.undefined_behavior, UndefinedBehavior::Strict) {
            Err(Error::from(ErrorKind::UndefinedError))
        } else {
            Ok(value)
        }
    }
}

/// Collects the variables a template can currently see into one map.
fn visible_context(state: &State) -> Value {
    let ctx: BTreeMap<String, Value> = state
        .known_variables()
        .into_iter()
        .filter_map(|name| {
            let value = state.lookup(&name)?;
            Some((name.into_owned(), value))
        })
        .collect();
    Value::from_serialize(&ctx)
}

/// Turns one argument of the template function into tokens.
///
/// Arguments are split like tag arguments.  If that yields a piece that
/// is not a token, but the argument as a whole is one (`light=not dark`),
/// the argument is kept intact.
fn argument_tokens(arg: &str) -> Result<Vec<&str>, Error> {
    match split_contents(arg) {
        Ok(tokens) if tokens.iter().all(|x| parse_token(x).is_some()) => Ok(tokens),
        rv => {
            let whole = arg.trim();
            if parse_token(whole).is_some() {
                Ok(vec![whole])
            } else {
                rv
            }
        }
    }
}

/// Builds a `class` attribute value from literal and conditional classes.
///
/// Every argument is split into tokens like the arguments of a template
/// tag: quoted literals are always included, `name=condition` includes
/// `name` only if `condition` is true in the current template context.
/// An argument holding a single condition with spaces in it, such as
/// `"muted=not selected"`, is taken as one token.
///
/// ```jinja
/// <div class="{{ class_names("'rounded p-4'", "ring-slate-900/5=selected dark:bg-slate-800=dark") }}">
/// <div class="{{ class_names("'row'", "row-error=item.errors|length > 0", "muted=not selected") }}">
/// ```
///
/// Conditions are compiled on every call in a scratch environment that
/// only knows the builtin filters and tests.  Filters, tests and
/// functions registered on the rendering environment are not available
/// inside conditions (`a=n|my_filter` fails with an unknown filter
/// error); compute such values in the template and pass the variable
/// instead.  For repeated rendering from Rust, or to use custom filters,
/// parse a [`ClassNames`] with your own environment.
pub fn class_names(state: &State, args: Rest<String>) -> Result<String, Error> {
    let mut tokens = Vec::new();
    for arg in args.iter() {
        tokens.extend(argument_tokens(arg)?);
    }

    let mut env = Environment::new();
    env.set_undefined_behavior(state.undefined_behavior());
    let directive = ClassNames::parse(&env, tokens)?;
    directive.render(visible_context(state))
}

#[test]
fn test_parse_token() {
    assert_eq!(
        parse_token("test1=True"),
        Some(Token::Assignment {
            name: "test1",
            value: "True"
        })
    );
    assert_eq!(
        parse_token("dark:bg-slate-800+=is_dark"),
        Some(Token::Assignment {
            name: "dark:bg-slate-800",
            value: "is_dark"
        })
    );
    assert_eq!(
        parse_token("@click.outside=\"open\""),
        Some(Token::Assignment {
            name: "@click.outside",
            value: "\"open\""
        })
    );
    assert_eq!(
        parse_token("\"test3\""),
        Some(Token::Literal { value: "\"test3\"" })
    );
    assert_eq!(parse_token("''"), Some(Token::Literal { value: "''" }));
    assert_eq!(parse_token("test1="), None);
    assert_eq!(parse_token("=True"), None);
    assert_eq!(parse_token("'test2\""), None);
    assert_eq!(parse_token("'te'st2'"), None);
    assert_eq!(parse_token("test4"), None);
}

#[test]
fn test_split_contents() {
    assert_eq!(split_contents("").unwrap(), Vec::<&str>::new());
    assert_eq!(split_contents("  a   b\n c ").unwrap(), ["a", "b", "c"]);
    assert_eq!(
        split_contents(r#"a='x y' "b c" d"#).unwrap(),
        ["a='x y'", "\"b c\"", "d"]
    );
    assert_eq!(
        split_contents(r#"'it\'s' x"#).unwrap(),
        [r#"'it\'s'"#, "x"]
    );

    let err = split_contents("a 'b c").unwrap_err();
    assert_eq!(err.kind(), minijinja::ErrorKind::SyntaxError);
    assert_eq!(
        err.to_string(),
        "syntax error: class_names found unclosed quote in \"'b c\""
    );
}

#[test]
fn test_argument_tokens() {
    assert_eq!(
        argument_tokens("test5=False ring-slate-900/5=True").unwrap(),
        ["test5=False", "ring-slate-900/5=True"]
    );
    assert_eq!(argument_tokens(" light=not dark ").unwrap(), ["light=not dark"]);
    assert_eq!(argument_tokens("a=x is defined").unwrap(), ["a=x is defined"]);
    assert_eq!(argument_tokens("'a' 'b'").unwrap(), ["'a'", "'b'"]);
    assert!(argument_tokens("'p-4' rounded").unwrap().contains(&"rounded"));
    assert_eq!(
        argument_tokens("'p-4").unwrap_err().kind(),
        minijinja::ErrorKind::SyntaxError
    );
}
