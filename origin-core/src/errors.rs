//! Aggregation of independent errors
use std::{error::Error as StdError, fmt};

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Several independent errors reported together.
///
/// Multi-step operations such as a group sync keep going after a single step fails and
/// return everything that went wrong at the end. A lone error displays as itself, several
/// display as `[a, b, c]`; use [`Aggregate::errors`] to report them one per line.
#[derive(Debug)]
pub struct Aggregate(Vec<BoxError>);

impl Aggregate {
    /// Aggregate `errors`, returning `None` when there are none
    pub fn new<E, I>(errors: I) -> Option<Self>
    where
        E: Into<BoxError>,
        I: IntoIterator<Item = E>,
    {
        let errors = errors.into_iter().map(Into::into).collect::<Vec<_>>();
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// The individual errors, in the order they occurred
    pub fn errors(&self) -> &[BoxError] {
        &self.0
    }

    /// Number of aggregated errors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed aggregate
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            many => {
                let msgs = many.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "[{}]", msgs.join(", "))
            }
        }
    }
}

impl StdError for Aggregate {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct Msg(&'static str);

    #[test]
    fn empty_input_yields_no_aggregate() {
        assert!(Aggregate::new(Vec::<Msg>::new()).is_none());
    }

    #[test]
    fn display_depends_on_count() {
        let one = Aggregate::new(vec![Msg("boom")]).unwrap();
        assert_eq!(one.to_string(), "boom");
        let two = Aggregate::new(vec![Msg("a"), Msg("b")]).unwrap();
        assert_eq!(two.to_string(), "[a, b]");
        assert_eq!(two.len(), 2);
        assert_eq!(two.errors()[1].to_string(), "b");
    }
}
