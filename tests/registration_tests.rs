//! Build-time integrity: normalization, duplicate detection, and the
//! registration-error taxonomy. These are the guarantees that make the
//! routing table trustworthy before the first request arrives.

use decor::{BoxFuture, Context, Controller, ControllerBuilder, Error, HandlerArg, Method};
use serde_json::Value;

struct Nop;

impl Controller for Nop {
    fn invoke<'a>(
        &'a mut self,
        handler: &'a str,
        _ctx: &'a mut Context,
        _args: Vec<HandlerArg>,
    ) -> BoxFuture<'a, Result<Option<Value>, Error>> {
        Box::pin(async move {
            Err(Error::UnknownHandler { controller: "Nop", handler: handler.to_owned() })
        })
    }
}

fn builder(base: &str) -> ControllerBuilder {
    ControllerBuilder::new("Nop", base).constructor(|_| Ok(Box::new(Nop)))
}

#[test]
fn duplicate_route_error_names_the_offender() {
    let err = builder("/")
        .route(Method::Post, "/user", "create")
        .route(Method::Post, "user", "create_again")
        .build()
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Nop"));
    assert!(message.contains("create_again"));
    assert!(message.contains("POST"));
    assert!(message.contains("'/user'"));
}

#[test]
fn normalization_makes_spelling_variants_collide() {
    // `user`, `/user`, and `user//` are all the same route.
    for variant in ["user", "/user", "user//"] {
        let result = builder("/")
            .route(Method::Get, "/user", "first")
            .route(Method::Get, variant, "second")
            .build();
        assert!(result.is_err(), "variant {variant:?} should collide");
    }
}

#[test]
fn the_same_path_under_different_verbs_coexists() {
    let def = builder("/")
        .route(Method::Get, "/user", "show")
        .route(Method::Post, "/user", "create")
        .route(Method::Delete, "/user", "remove")
        .build()
        .unwrap();
    assert_eq!(def.routes().count(), 3);
}

#[test]
fn duplicates_are_scoped_per_controller() {
    // Two different controllers may declare the same verb + path; that is
    // the fan-out feature, not a conflict.
    let a = builder("/").route(Method::Get, "/", "home").build();
    let b = builder("/").route(Method::Get, "/", "home").build();
    assert!(a.is_ok());
    assert!(b.is_ok());
}

#[test]
fn internal_slash_runs_collapse_in_compiled_paths() {
    let def = builder("/api//v1/")
        .route(Method::Get, "users//all", "all")
        .build()
        .unwrap();
    let (_, path, _) = def.routes().next().unwrap();
    assert_eq!(path, "/api/v1/users/all");
}

#[test]
fn an_unnamed_capture_is_rejected() {
    let err = builder("/").route(Method::Get, "/users/:", "broken").build().unwrap_err();
    let Error::InvalidRoute { path, .. } = err else { panic!("wrong variant") };
    assert_eq!(path, "/users/:");
}

#[test]
fn a_controller_without_a_constructor_does_not_build() {
    let err = ControllerBuilder::new("Nop", "/").build().unwrap_err();
    assert!(matches!(err, Error::MissingConstructor { controller: "Nop" }));
}
