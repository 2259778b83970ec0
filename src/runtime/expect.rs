//! Assertion API called by generated cases.
//!
//! Every function takes its operands in the order they appear in the
//! source. The substring and membership checks test the second operand
//! against the first: `expect_in(container, member)`.

use super::case::{AssertionFailure, CaseFailure};
use super::Value;

fn check(condition: bool, message: impl FnOnce() -> String) -> Result<(), CaseFailure> {
    if condition {
        Ok(())
    } else {
        Err(CaseFailure::Assertion(AssertionFailure::new(message())))
    }
}

pub fn expect_equal(first: &Value, second: &Value) -> Result<(), CaseFailure> {
    check(first == second, || format!("{} != {}", first, second))
}

pub fn expect_not_equal(first: &Value, second: &Value) -> Result<(), CaseFailure> {
    check(first != second, || format!("{} == {}", first, second))
}

pub fn expect_str_equal(first: &Value, second: &Value) -> Result<(), CaseFailure> {
    let (first, second) = (first.to_string(), second.to_string());
    check(first == second, || format!("'{}' != '{}'", first, second))
}

pub fn expect_str_not_equal(first: &Value, second: &Value) -> Result<(), CaseFailure> {
    let (first, second) = (first.to_string(), second.to_string());
    check(first != second, || format!("'{}' == '{}'", first, second))
}

pub fn expect_substr(haystack: &Value, needle: &Value) -> Result<(), CaseFailure> {
    let (haystack, needle) = (haystack.to_string(), needle.to_string());
    check(haystack.contains(&needle), || {
        format!("'{}' not found in '{}'", needle, haystack)
    })
}

pub fn expect_no_substr(haystack: &Value, needle: &Value) -> Result<(), CaseFailure> {
    let (haystack, needle) = (haystack.to_string(), needle.to_string());
    check(!haystack.contains(&needle), || {
        format!("'{}' unexpectedly found in '{}'", needle, haystack)
    })
}

pub fn expect_in(container: &Value, member: &Value) -> Result<(), CaseFailure> {
    let found = container.contains(member)?;
    check(found, || format!("{} not found in {}", member, container))
}

pub fn expect_not_in(container: &Value, member: &Value) -> Result<(), CaseFailure> {
    let found = container.contains(member)?;
    check(!found, || format!("{} unexpectedly found in {}", member, container))
}
