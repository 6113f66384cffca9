//! MiniJinja-Simplify is a utility crate for [MiniJinja](https://github.com/mitsuhiko/minijinja)
//! with two helpers that keep HTML templates short:
//!
//! * [`dom_id`](dom_id::dom_id) derives stable `id` attributes from
//!   records, record types and plain values.
//! * [`class_names`](class_names::class_names) builds `class` attributes
//!   from literal classes and classes that are only included if a
//!   condition holds.
//!
//! To add both to an environment you can use the [`add_to_environment`]
//! function.
//!
//! ```
//! use minijinja::{context, Environment, Value};
//! use minijinja_simplify::model::Model;
//!
//! let mut env = Environment::new();
//! minijinja_simplify::add_to_environment(&mut env);
//!
//! let todo = Value::from_object(Model::new("TodoItem").with_pk(1));
//! let rv = env.render_str(
//!     r#"<li id="{{ dom_id(todo) }}" class="{{ class_names("'item'", "done=todo.done") }}">"#,
//!     context! { todo },
//! ).unwrap();
//! assert_eq!(rv, r#"<li id="todoitem_1" class="item">"#);
//! ```
//!
//! For rendering the same class list many times from Rust, parse it once
//! into a [`ClassNames`](class_names::ClassNames) and render that.
#![cfg_attr(docsrs, feature(doc_cfg))]

use minijinja::Environment;

mod error;

/// The `class_names` directive.
pub mod class_names;

/// DOM identifier derivation.
pub mod dom_id;

/// Entity objects understood by [`dom_id`](dom_id::dom_id).
pub mod model;

pub use self::error::{DirectiveSyntaxError, MissingIdentityError};

/// Registers all features of this crate with an [`Environment`].
///
/// This adds the `dom_id` and `class_names` global functions.  To use
/// `dom_id` with a custom classifier, register a
/// [`DomId`](dom_id::DomId) afterwards which replaces the default one.
pub fn add_to_environment(env: &mut Environment) {
    env.add_function("dom_id", dom_id::dom_id);
    env.add_function("class_names", class_names::class_names);
}
