#![forbid(unsafe_code)]

//! Candidate identities and bound model values.
//!
//! Every candidate is identified by an [`OptionKey`]: the textual value the
//! candidate submits when selected. Model values are richer ([`ModelValue`])
//! and match a candidate only through their key form, see
//! [`ModelValue::option_key`].
//!
//! [`ModelValue::hash_key`] produces a type-tagged key (`string:r2d2`,
//! `number:1`, `object:null`, ...) that distinguishes values whose key forms
//! collide. It backs the unknown entry's placeholder text.

use core::borrow::Borrow;
use core::fmt;

/// Keys that collide with registry bookkeeping and may never name a candidate.
pub const RESERVED_KEYS: &[&str] = &["hasOwnProperty"];

/// Whether `key` is in the built-in reserved denylist.
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

// ---------------------------------------------------------------------------
// OptionKey
// ---------------------------------------------------------------------------

/// Textual identity of a candidate.
///
/// Two candidates with equal keys are duplicates of each other; the registry
/// counts them rather than rejecting them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct OptionKey(String);

impl OptionKey {
    /// Create a key from any string-like value.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The empty key, submitted by an empty entry.
    #[must_use]
    pub const fn empty() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for OptionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OptionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OptionKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl From<String> for OptionKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

// ---------------------------------------------------------------------------
// ModelValue
// ---------------------------------------------------------------------------

/// A value bound to a choice control.
///
/// Single-choice controls bind a scalar; multi-choice controls bind a
/// [`ModelValue::List`]. A control starts out bound to
/// [`ModelValue::Undefined`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ModelValue>),
}

impl ModelValue {
    /// Shorthand for [`ModelValue::Text`].
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Build a list value from anything convertible into model values.
    #[must_use]
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ModelValue>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Whether this is the empty string, the value an empty entry submits.
    #[must_use]
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }

    /// The list members, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[ModelValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The candidate key this value selects, if it has a key form.
    ///
    /// `Undefined`, `Null` and lists never select a real candidate.
    #[must_use]
    pub fn option_key(&self) -> Option<OptionKey> {
        match self {
            Self::Text(text) => Some(OptionKey::new(text.as_str())),
            Self::Number(n) => Some(OptionKey::new(format_number(*n))),
            Self::Bool(b) => Some(OptionKey::new(if *b { "true" } else { "false" })),
            Self::Undefined | Self::Null | Self::List(_) => None,
        }
    }

    /// Type-tagged textual key.
    ///
    /// Distinct values produce distinct keys; equal values always produce the
    /// same key. List members have `\\` and `,` backslash-escaped so member
    /// boundaries stay unambiguous.
    #[must_use]
    pub fn hash_key(&self) -> String {
        match self {
            Self::Undefined => "undefined:undefined".to_owned(),
            Self::Null => "object:null".to_owned(),
            Self::Bool(b) => format!("boolean:{b}"),
            Self::Number(n) => format!("number:{}", format_number(*n)),
            Self::Text(text) => format!("string:{text}"),
            Self::List(items) => {
                let inner: Vec<String> = items
                    .iter()
                    .map(|item| escape_member(&item.hash_key()))
                    .collect();
                format!("object:[{}]", inner.join(","))
            }
        }
    }

    /// Parse a scalar hash key back into its value.
    ///
    /// List keys are not reversible and yield `None`.
    #[must_use]
    pub fn from_hash_key(key: &str) -> Option<Self> {
        let (tag, rest) = key.split_once(':')?;
        match tag {
            "undefined" if rest == "undefined" => Some(Self::Undefined),
            "object" if rest == "null" => Some(Self::Null),
            "boolean" => match rest {
                "true" => Some(Self::Bool(true)),
                "false" => Some(Self::Bool(false)),
                _ => None,
            },
            "number" => rest.parse::<f64>().ok().map(Self::Number),
            "string" => Some(Self::Text(rest.to_owned())),
            _ => None,
        }
    }
}

impl From<&str> for ModelValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ModelValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ModelValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ModelValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for ModelValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&OptionKey> for ModelValue {
    fn from(key: &OptionKey) -> Self {
        Self::Text(key.as_str().to_owned())
    }
}

impl<V: Into<ModelValue>> From<Option<V>> for ModelValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Placeholder text shown by the unknown entry for `value`.
#[must_use]
pub fn unknown_label(value: &ModelValue) -> String {
    format!("? {} ?", value.hash_key())
}

fn escape_member(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for ch in key.chars() {
        if matches!(ch, '\\' | ',') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Integral values print without a fractional part (`1`, not `1.0`).
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_owned()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
