//! Expectation behavior: argument matching, return values and call counts.

mod common;

use common::subject;
use doublet::prelude::*;
use doublet::Times;

fn is_argument_mismatch(err: &DoubleError) -> bool {
    matches!(
        err,
        DoubleError::Expectation {
            failure: ExpectationFailure::Arguments { .. },
            ..
        }
    )
}

#[test]
fn matching_call_returns_declared_value() {
    let subject = subject();
    doublet::expect(
        &subject,
        "baz",
        Expectation::new().with(args!["value"]).returns("result"),
        |_| {
            assert_eq!(subject.call("baz", &args!["value"])?, Value::from("result"));
            Ok::<_, DoubleError>(())
        },
    )
    .unwrap();
    assert_eq!(
        subject.call("baz", &args!["value"]).unwrap(),
        Value::from("value")
    );
}

#[test]
fn mismatched_call_raises_at_call_site() {
    let subject = subject();
    let result = doublet::expect(
        &subject,
        "baz",
        Expectation::new().with(args!["value"]).returns("result"),
        |_| {
            let err = subject.call("baz", &args!["another"]).unwrap_err();
            assert!(is_argument_mismatch(&err));
            Ok::<_, DoubleError>(())
        },
    );
    assert!(is_argument_mismatch(&result.unwrap_err()));
}

#[test]
fn swallowed_mismatch_still_fails_the_expectation() {
    let subject = subject();
    let result: DoubleResult<()> = doublet::expect(
        &subject,
        "baz",
        Expectation::new().with(args!["value"]).returns("result"),
        |_| {
            let _ = subject.call("baz", &args!["another"]).unwrap_or_default();
            let _ = subject.call("baz", &args!["value"]);
            Ok(())
        },
    );
    match result {
        Err(DoubleError::Expectation {
            failure: ExpectationFailure::Arguments { actual, difference, .. },
            ..
        }) => {
            assert_eq!(actual, args!["another"]);
            assert!(difference.starts_with("[0]"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!subject.is_patched("baz"));
}

#[test]
fn block_error_wins_over_swallowed_mismatch() {
    let subject = subject();
    let result: DoubleResult<()> = doublet::expect(
        &subject,
        "baz",
        Expectation::new().with(args!["value"]).returns("result"),
        |_| {
            let _ = subject.call("baz", &args!["another"]);
            Err(DoubleError::usage("block failed"))
        },
    );
    assert!(matches!(result, Err(DoubleError::Usage { .. })));
}

#[test]
fn expect_unknown_method_is_rejected() {
    let subject = subject();
    let result: DoubleResult<()> =
        doublet::expect(&subject, "nan", Expectation::new().returns("x"), |_| Ok(()));
    assert!(matches!(
        result,
        Err(DoubleError::UnknownMethod { ref method, .. }) if method == "nan"
    ));

    let result: DoubleResult<()> = doublet::expect(&subject, "nan", Expectation::new(), |_| Ok(()));
    assert!(matches!(result, Err(DoubleError::UnknownMethod { .. })));
    assert!(!subject.is_patched("nan"));
    assert!(subject.method_names().is_empty());
}

#[test]
fn install_expectation_unknown_method_is_rejected() {
    let subject = subject();
    let err = doublet::install_expectation(&subject, "nan", Expectation::new().returns("x"))
        .unwrap_err();
    assert!(matches!(err, DoubleError::UnknownMethod { ref method, .. } if method == "nan"));
    assert!(!subject.is_patched("nan"));
    assert!(!subject.is_patched("foo"));
}

#[test]
fn default_expectation_takes_no_arguments() {
    let subject = subject();
    doublet::expect(&subject, "foo", Expectation::new().returns("bar"), |_| {
        assert_eq!(subject.call("foo", &[])?, Value::from("bar"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();
}

#[test]
fn unexpected_argument_to_no_argument_expectation_raises() {
    let subject = subject();
    let result = doublet::expect(&subject, "foo", Expectation::new().returns("bar"), |_| {
        let err = subject.call("foo", &args!["x"]).unwrap_err();
        assert!(is_argument_mismatch(&err));
        Ok::<_, DoubleError>(())
    });
    assert!(is_argument_mismatch(&result.unwrap_err()));
}

#[test]
fn multiple_arguments_and_keywords() {
    let subject = subject();
    let expected = args!["new foo", kwargs! { "optional" => true }];
    doublet::expect(
        &subject,
        "foo",
        Expectation::new().with(expected.clone()).returns("new foo"),
        |_| {
            assert_eq!(subject.call("foo", &expected)?, Value::from("new foo"));
            Ok::<_, DoubleError>(())
        },
    )
    .unwrap();

    let wrong = args!["new foo", kwargs! { "optional" => false }];
    let result = doublet::expect(
        &subject,
        "foo",
        Expectation::new().with(expected.clone()).returns("new foo"),
        |_| {
            let err = subject.call("foo", &wrong).unwrap_err();
            assert!(err.to_string().contains("optional"));
            Ok::<_, DoubleError>(())
        },
    );
    assert!(result.unwrap_err().to_string().contains("optional"));
}

#[test]
fn expectation_without_invocation_is_not_an_error() {
    let subject = subject();
    let result: DoubleResult<()> =
        doublet::expect(&subject, "foo", Expectation::new().returns("bar"), |_| Ok(()));
    assert!(result.is_ok());
    assert!(!subject.is_patched("foo"));
}

#[test]
fn missing_return_value_is_usage_error() {
    let subject = subject();
    let result: DoubleResult<()> =
        doublet::expect(&subject, "foo", Expectation::new(), |_| Ok(()));
    assert!(matches!(result, Err(DoubleError::Usage { .. })));
}

#[test]
fn call_count_is_checked_after_scope() {
    let subject = subject();
    let result: DoubleResult<()> = doublet::expect(
        &subject,
        "foo",
        Expectation::new().returns("bar").once(),
        |_| {
            subject.call("foo", &[])?;
            subject.call("foo", &[])?;
            Ok(())
        },
    );
    match result {
        Err(DoubleError::Expectation {
            failure: ExpectationFailure::CallCount { expected, actual },
            ..
        }) => {
            assert_eq!(expected, Times::Exactly(1).to_string());
            assert_eq!(actual, 2);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!subject.is_patched("foo"));
}

#[test]
fn never_expectation_passes_when_untouched() {
    let subject = subject();
    let result: DoubleResult<()> =
        doublet::expect(&subject, "foo", Expectation::new().returns("bar").never(), |_| Ok(()));
    assert!(result.is_ok());
}

#[test]
fn open_expectation_is_removed_by_unstub() {
    let subject = subject();
    let handle = doublet::install_expectation(
        &subject,
        "baz",
        Expectation::new().with(args![1, 2.5]).returns(Value::Nil).at_most(1),
    )
    .unwrap();

    assert!(subject.call("baz", &args![1, 2.5]).unwrap().is_nil());
    assert!(handle.verify().is_ok());
    assert_eq!(handle.calls().len(), 1);

    doublet::unstub(&subject, &["baz"]).unwrap();
    assert_eq!(subject.call("baz", &args![7]).unwrap(), Value::Int(7));
}

#[test]
fn expectation_nested_in_stub_calls_through() {
    let subject = subject();
    doublet::stub(&subject, "foo", "outer", |_| {
        doublet::expect(&subject, "foo", Expectation::new().returns("inner"), |original| {
            assert_eq!(subject.call("foo", &[])?, Value::from("inner"));
            assert_eq!(original.call(&[])?, Value::from("outer"));
            Ok::<_, DoubleError>(())
        })?;
        assert_eq!(subject.call("foo", &[])?, Value::from("outer"));
        Ok::<_, DoubleError>(())
    })
    .unwrap();
}
