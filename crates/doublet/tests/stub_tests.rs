//! Stub session behavior: replacement, restoration, nesting and unstub.

mod common;

use common::{call0, subject, subject_class};
use doublet::prelude::*;
use std::panic::{self, AssertUnwindSafe};

// ============================================================================
// Shape and lookup errors
// ============================================================================

#[test]
fn unknown_method_is_rejected() {
    let subject = subject();
    let result: DoubleResult<()> = doublet::stub(&subject, "nan", Value::Nil, |_| Ok(()));
    assert!(matches!(
        result,
        Err(DoubleError::UnknownMethod { ref method, .. }) if method == "nan"
    ));
}

#[test]
fn unknown_method_in_open_form_is_rejected() {
    let err = doublet::install_stubs(&subject(), [("foo", "a"), ("nan", "b")]).unwrap_err();
    assert!(matches!(err, DoubleError::UnknownMethod { .. }));
}

#[test]
fn empty_method_map_is_usage_error() {
    let empty: Vec<(&str, Replacement)> = Vec::new();
    let result: DoubleResult<()> = doublet::stub_many(&subject(), empty, |_| Ok(()));
    assert!(matches!(result, Err(DoubleError::Usage { .. })));
}

// ============================================================================
// Replacement kinds
// ============================================================================

#[test]
fn stubbed_method_returns_new_value() {
    let subject = subject();
    let before = call0(&subject, "foo");

    doublet::stub(&subject, "foo", "new foo", |_| {
        assert_eq!(call0(&subject, "foo"), Value::from("new foo"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();

    assert_eq!(call0(&subject, "foo"), before);
}

#[test]
fn stubs_method_with_a_callable() {
    let subject = subject();
    let before = call0(&subject, "foo");

    doublet::stub(
        &subject,
        "foo",
        Replacement::func(|_| Value::from("new foo")),
        |_| {
            assert_eq!(call0(&subject, "foo"), Value::from("new foo"));
            Ok::<_, DoubleError>(())
        },
    )
    .unwrap();

    assert_eq!(call0(&subject, "foo"), before);
}

#[test]
fn stubs_method_with_a_callable_that_requires_arguments() {
    let subject = subject();
    let before = call0(&subject, "foo");

    let replacement = Replacement::try_func(|args| match args {
        [Value::Str(a)] => Ok(Value::from(format!("new {a}"))),
        _ => Err(DoubleError::usage("expected one string")),
    });
    doublet::stub(&subject, "foo", replacement, |_| {
        assert_eq!(subject.call("foo", &args!["foo"])?, Value::from("new foo"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();

    assert_eq!(call0(&subject, "foo"), before);
}

#[test]
fn block_value_is_returned() {
    let subject = subject();
    let value = doublet::stub(&subject, "foo", 42, |_| subject.call("foo", &[])).unwrap();
    assert_eq!(value, Value::Int(42));
}

// ============================================================================
// Invocation requirement
// ============================================================================

#[test]
fn never_invoked_single_stub_fails_after_block() {
    let subject = subject();
    let result: DoubleResult<()> = doublet::stub(&subject, "foo", "value", |_| Ok(()));
    assert!(matches!(
        result,
        Err(DoubleError::NotInvoked { ref method, .. }) if method == "foo"
    ));
    assert_eq!(call0(&subject, "foo"), Value::from("foo"));
}

#[test]
fn multi_method_block_does_not_require_invocation() {
    let subject = subject();
    let result: DoubleResult<()> =
        doublet::stub_many(&subject, [("foo", "a"), ("bar", "b")], |_| Ok(()));
    assert!(result.is_ok());
}

#[test]
fn multi_method_block_replaces_all_then_restores() {
    let subject = subject();
    doublet::stub_many(&subject, [("foo", "new foo"), ("bar", "new bar")], |_| {
        assert_eq!(call0(&subject, "foo"), Value::from("new foo"));
        assert_eq!(call0(&subject, "bar"), Value::from("new bar"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();
    assert_eq!(call0(&subject, "foo"), Value::from("foo"));
    assert_eq!(call0(&subject, "bar"), Value::from("bar"));
}

// ============================================================================
// Unconditional restoration
// ============================================================================

#[test]
fn restores_when_block_fails() {
    let subject = subject();
    let result: DoubleResult<()> = doublet::stub(&subject, "foo", "stubbed", |_| {
        call0(&subject, "foo");
        Err(DoubleError::usage("boom"))
    });
    assert!(result.is_err());
    assert!(!subject.is_patched("foo"));
    assert_eq!(call0(&subject, "foo"), Value::from("foo"));
}

#[test]
fn restores_when_block_panics() {
    let subject = subject();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _: DoubleResult<()> = doublet::stub_many(&subject, [("foo", "a"), ("bar", "b")], |_| {
            panic!("assertion failed inside block");
        });
    }));
    assert!(outcome.is_err());
    assert!(!subject.is_patched("foo"));
    assert!(!subject.is_patched("bar"));
    assert_eq!(call0(&subject, "bar"), Value::from("bar"));
}

// ============================================================================
// Nesting and call-through
// ============================================================================

#[test]
fn can_have_a_stub_within_a_stub() {
    let subject = subject();
    doublet::stub(&subject, "foo", "outer", |_| {
        doublet::stub(&subject, "foo", "inner", |_| {
            assert_eq!(call0(&subject, "foo"), Value::from("inner"));
            Ok::<_, DoubleError>(())
        })?;
        assert_eq!(call0(&subject, "foo"), Value::from("outer"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();
    assert_eq!(call0(&subject, "foo"), Value::from("foo"));
}

#[test]
fn inner_hook_calls_through_to_outer_replacement() {
    let subject = subject();
    doublet::stub(&subject, "foo", "outer", |_| {
        doublet::stub(&subject, "foo", "inner", |original| {
            assert_eq!(call0(&subject, "foo"), Value::from("inner"));
            assert_eq!(original.call(&[])?, Value::from("outer"));
            Ok::<_, DoubleError>(())
        })?;
        call0(&subject, "foo");
        Ok::<_, DoubleError>(())
    })
    .unwrap();
}

#[test]
fn yields_a_hook_to_call_the_original_method() {
    let subject = subject();
    doublet::stub(&subject, "foo", "outer", |original| {
        assert_eq!(call0(&subject, "foo"), Value::from("outer"));
        assert_eq!(original.call(&[])?, Value::from("foo"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();
}

#[test]
fn multi_method_hook_targets_last_method() {
    let subject = subject();
    doublet::stub_many(&subject, [("foo", "a"), ("bar", "b")], |original| {
        assert_eq!(original.method(), "bar");
        assert_eq!(original.call(&[])?, Value::from("bar"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();
}

#[test]
fn replacement_can_observe_real_value() {
    let subject = subject();
    let seen = std::rc::Rc::new(std::cell::RefCell::new(None));
    let seen_in_stub = std::rc::Rc::clone(&seen);
    let replacement = Replacement::through(move |args, original| {
        *seen_in_stub.borrow_mut() = Some(original.call(args)?);
        Ok(Value::from("replaced"))
    });

    doublet::stub(&subject, "baz", replacement, |_| {
        assert_eq!(subject.call("baz", &args!["real"])?, Value::from("replaced"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();

    assert_eq!(*seen.borrow(), Some(Value::from("real")));
}

// ============================================================================
// Class-level and shared-prototype targets
// ============================================================================

#[test]
fn class_level_methods_are_patchable() {
    let class = subject_class();
    doublet::stub(class.object(), "foo", "class stub", |_| {
        assert_eq!(call0(class.object(), "foo"), Value::from("class stub"));
        assert_eq!(call0(&class.new_instance(), "foo"), Value::from("foo"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();
    assert_eq!(call0(class.object(), "foo"), Value::from("foo"));
}

#[test]
fn prototype_stub_applies_to_every_instance() {
    let class = subject_class();
    let a = class.new_instance();
    let b = class.new_instance();
    doublet::stub(class.prototype(), "foo", "any instance", |original| {
        assert_eq!(call0(&a, "foo"), Value::from("any instance"));
        assert_eq!(call0(&b, "foo"), Value::from("any instance"));
        assert_eq!(original.call(&[])?, Value::from("foo"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();
    assert_eq!(call0(&a, "foo"), Value::from("foo"));
}

#[test]
fn inherited_methods_are_patchable() {
    let child = subject_class().subclass("Child");
    let instance = child.new_instance();
    doublet::stub(&instance, "bar", "child bar", |_| {
        assert_eq!(call0(&instance, "bar"), Value::from("child bar"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();
    assert_eq!(call0(&instance, "bar"), Value::from("bar"));
}

// ============================================================================
// Open-ended stubs and unstub
// ============================================================================

#[test]
fn open_stub_stays_until_unstub() {
    let subject = subject();
    let sub = doublet::install_stub(&subject, "foo", "open").unwrap();
    assert_eq!(call0(&subject, "foo"), Value::from("open"));
    assert!(sub.was_invoked());

    doublet::unstub(&subject, &["foo"]).unwrap();
    assert_eq!(call0(&subject, "foo"), Value::from("foo"));
}

#[test]
fn unstub_restores_only_named_methods() {
    let subject = subject();
    doublet::install_stubs(
        &subject,
        [
            ("foo", Replacement::value("new foo")),
            ("bar", Replacement::value("new bar")),
            ("baz", Replacement::value("new baz")),
        ],
    )
    .unwrap();

    doublet::unstub(&subject, &["foo", "bar"]).unwrap();

    assert_eq!(call0(&subject, "foo"), Value::from("foo"));
    assert_eq!(call0(&subject, "bar"), Value::from("bar"));
    assert_eq!(
        subject.call("baz", &args!["anything"]).unwrap(),
        Value::from("new baz")
    );
}

#[test]
fn unstub_of_unstubbed_method_fails() {
    let err = doublet::unstub(&subject(), &["foo"]).unwrap_err();
    assert!(matches!(err, DoubleError::NotStubbed { .. }));
}

#[test]
fn unstub_pops_only_most_recent() {
    let subject = subject();
    doublet::install_stub(&subject, "foo", "first").unwrap();
    doublet::install_stub(&subject, "foo", "second").unwrap();

    doublet::unstub(&subject, &["foo"]).unwrap();
    assert_eq!(call0(&subject, "foo"), Value::from("first"));
    doublet::unstub(&subject, &["foo"]).unwrap();
    assert_eq!(call0(&subject, "foo"), Value::from("foo"));
}

#[test]
fn unstub_inside_scope_does_not_break_scope_exit() {
    let subject = subject();
    doublet::stub(&subject, "foo", "scoped", |_| {
        call0(&subject, "foo");
        doublet::unstub(&subject, &["foo"])?;
        assert_eq!(call0(&subject, "foo"), Value::from("foo"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();
    assert_eq!(call0(&subject, "foo"), Value::from("foo"));
}

#[test]
fn recorded_arguments_are_available() {
    let subject = subject();
    let sub = doublet::install_stub(&subject, "baz", Value::Nil).unwrap();
    subject.call("baz", &args!["one"]).unwrap();
    subject.call("baz", &args!["two", kwargs! { "flag" => true }]).unwrap();

    assert_eq!(sub.call_count(), 2);
    assert_eq!(sub.last_arguments(), args!["two", kwargs! { "flag" => true }]);
    let calls = sub.calls();
    assert_eq!(calls[0].sequence, 1);
    assert_eq!(calls[0].arguments, args!["one"]);
    doublet::unstub(&subject, &["baz"]).unwrap();
}
