//! Built-in validators.
//!
//! Text rules work on anything that derefs to `str` (`String`, `&'static str`,
//! `Box<str>`). Empty values pass every text rule except [`required`], so
//! optional fields only need the rules that apply once filled in.

use regex::Regex;

use super::Validator;
use crate::error::FieldStateError;

/// Require the value to be non-blank.
pub fn required<V>(msg: impl Into<String>) -> Validator<V>
where
    V: AsRef<str> + 'static,
{
    Validator::rule(|v: &V| !v.as_ref().trim().is_empty(), msg)
}

/// Require at least `min` characters.
pub fn min_length<V>(min: usize, msg: impl Into<String>) -> Validator<V>
where
    V: AsRef<str> + 'static,
{
    Validator::rule(
        move |v: &V| {
            let v = v.as_ref();
            v.is_empty() || v.chars().count() >= min
        },
        msg,
    )
}

/// Require at most `max` characters.
pub fn max_length<V>(max: usize, msg: impl Into<String>) -> Validator<V>
where
    V: AsRef<str> + 'static,
{
    Validator::rule(move |v: &V| v.as_ref().chars().count() <= max, msg)
}

/// Require the value to match a regular expression.
pub fn pattern<V>(pattern: &str, msg: impl Into<String>) -> Result<Validator<V>, FieldStateError>
where
    V: AsRef<str> + 'static,
{
    let re = Regex::new(pattern).map_err(|source| FieldStateError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(Validator::rule(
        move |v: &V| {
            let v = v.as_ref();
            v.is_empty() || re.is_match(v)
        },
        msg,
    ))
}

/// Require a valid email address.
pub fn email<V>(msg: impl Into<String>) -> Validator<V>
where
    V: AsRef<str> + 'static,
{
    Validator::rule(
        |v: &V| {
            let v = v.as_ref();
            v.is_empty() || email_address::EmailAddress::is_valid(v)
        },
        msg,
    )
}

/// Require the value to contain a substring.
pub fn contains<V>(substr: impl Into<String>, msg: impl Into<String>) -> Validator<V>
where
    V: AsRef<str> + 'static,
{
    let substr = substr.into();
    Validator::rule(move |v: &V| v.as_ref().contains(&substr), msg)
}

/// Require the value to equal `other`.
pub fn equals<V>(other: V, msg: impl Into<String>) -> Validator<V>
where
    V: PartialEq + Send + Sync + 'static,
{
    Validator::rule(move |v: &V| *v == other, msg)
}

/// Require a checkbox to be checked.
pub fn checked(msg: impl Into<String>) -> Validator<bool> {
    Validator::rule(|&v: &bool| v, msg)
}

/// Require that an option is selected.
pub fn selected<T: 'static>(msg: impl Into<String>) -> Validator<Option<T>> {
    Validator::rule(|v: &Option<T>| v.is_some(), msg)
}
