//! Field-level validation errors.
//!
//! Validation functions in this workspace return an [`ErrorList`] rather than a `Result`,
//! so that every problem in an object is reported at once. Each [`Error`] names the field it
//! applies to using a dotted [`Path`], and renders the same way the Kubernetes API server
//! renders its field errors.
use std::fmt;

/// A dotted path to a field, e.g. `metadata.labels[app]` or `identityProvider[0].provider`
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(String);

impl Path {
    /// Create a root path
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    /// Path to a named child field
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_owned())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    /// Path to an element of a list
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    /// Path to an entry of a map
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        Self(format!("{}[{}]", self.0, key))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The class of a field [`Error`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// A required field was empty
    Required,
    /// A field value was malformed
    Invalid,
    /// A field value was not one of an enumerated set
    NotSupported,
    /// A field may not be set in this context
    Forbidden,
    /// A value occurred more than once where it must be unique
    Duplicate,
    /// A value exceeded its maximum length
    TooLong,
}

impl ErrorType {
    fn as_str(self) -> &'static str {
        match self {
            ErrorType::Required => "Required value",
            ErrorType::Invalid => "Invalid value",
            ErrorType::NotSupported => "Unsupported value",
            ErrorType::Forbidden => "Forbidden",
            ErrorType::Duplicate => "Duplicate value",
            ErrorType::TooLong => "Too long",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation failure for one field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    /// What kind of failure this is
    pub type_: ErrorType,
    /// Dotted path of the offending field
    pub field: String,
    /// The rejected value, when there is one worth echoing back
    pub bad_value: Option<String>,
    /// Extra human-readable context
    pub detail: String,
}

impl Error {
    /// The field is required but was empty
    pub fn required(field: impl fmt::Display, detail: impl Into<String>) -> Self {
        Self {
            type_: ErrorType::Required,
            field: field.to_string(),
            bad_value: None,
            detail: detail.into(),
        }
    }

    /// The field holds a malformed value
    pub fn invalid(field: impl fmt::Display, value: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_: ErrorType::Invalid,
            field: field.to_string(),
            bad_value: Some(value.into()),
            detail: detail.into(),
        }
    }

    /// The field holds a value outside of `valid`
    pub fn not_supported(field: impl fmt::Display, value: impl Into<String>, valid: &[&str]) -> Self {
        let detail = if valid.is_empty() {
            String::new()
        } else {
            let quoted = valid.iter().map(|v| format!("{v:?}")).collect::<Vec<_>>();
            format!("supported values: {}", quoted.join(", "))
        };
        Self {
            type_: ErrorType::NotSupported,
            field: field.to_string(),
            bad_value: Some(value.into()),
            detail,
        }
    }

    /// The field may not be set here
    pub fn forbidden(field: impl fmt::Display, detail: impl Into<String>) -> Self {
        Self {
            type_: ErrorType::Forbidden,
            field: field.to_string(),
            bad_value: None,
            detail: detail.into(),
        }
    }

    /// The value is repeated
    pub fn duplicate(field: impl fmt::Display, value: impl Into<String>) -> Self {
        Self {
            type_: ErrorType::Duplicate,
            field: field.to_string(),
            bad_value: Some(value.into()),
            detail: String::new(),
        }
    }

    /// The value is longer than `max`
    pub fn too_long(field: impl fmt::Display, max: usize) -> Self {
        Self {
            type_: ErrorType::TooLong,
            field: field.to_string(),
            bad_value: None,
            detail: format!("must have at most {max} bytes"),
        }
    }

    /// The error message without the field name
    pub fn body(&self) -> String {
        let mut s = match &self.bad_value {
            Some(value) => format!("{}: {:?}", self.type_, value),
            None => self.type_.to_string(),
        };
        if !self.detail.is_empty() {
            s.push_str(": ");
            s.push_str(&self.detail);
        }
        s
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.body())
    }
}

impl std::error::Error for Error {}

/// An ordered collection of field [`Error`]s
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorList(Vec<Error>);

impl ErrorList {
    /// An empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one error
    pub fn push(&mut self, err: Error) {
        self.0.push(err);
    }

    /// True when no errors were recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded errors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the recorded errors
    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    /// Prepend `prefix.` to every field name.
    ///
    /// Used to nest the errors of a sub-section under the name of the section.
    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        for err in &mut self.0 {
            err.field = if err.field.is_empty() {
                prefix.to_owned()
            } else {
                format!("{}.{}", prefix, err.field)
            };
        }
        self
    }

    /// Convert into an [`Aggregate`](crate::errors::Aggregate), `None` when empty
    pub fn into_aggregate(self) -> Option<crate::errors::Aggregate> {
        crate::errors::Aggregate::new(self.0)
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => Ok(()),
            [single] => write!(f, "{single}"),
            many => {
                let msgs = many.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "[{}]", msgs.join(", "))
            }
        }
    }
}

impl From<Vec<Error>> for ErrorList {
    fn from(errs: Vec<Error>) -> Self {
        Self(errs)
    }
}

impl From<Error> for ErrorList {
    fn from(err: Error) -> Self {
        Self(vec![err])
    }
}

impl FromIterator<Error> for ErrorList {
    fn from_iter<I: IntoIterator<Item = Error>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Error> for ErrorList {
    fn extend<I: IntoIterator<Item = Error>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ErrorList {
    type IntoIter = std::vec::IntoIter<Error>;
    type Item = Error;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type IntoIter = std::slice::Iter<'a, Error>;
    type Item = &'a Error;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
