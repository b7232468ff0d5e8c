use std::collections::BTreeMap;

use crate::error::PipelineError;

/// What to do when a scalar aggregate has no value (mean of an empty sequence).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AbsentPolicy {
    /// Keep the absence (`None`)
    #[default]
    Empty,

    /// Substitute the given value
    Default(f64),

    /// Raise [`PipelineError::IllegalState`]
    Fail,
}

impl AbsentPolicy {
    /// Resolves an optional aggregate. Present values pass through untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use sluice::stream::AbsentPolicy;
    ///
    /// assert_eq!(AbsentPolicy::Empty.resolve(None).unwrap(), None);
    /// assert_eq!(AbsentPolicy::Default(0.0).resolve(None).unwrap(), Some(0.0));
    /// assert!(AbsentPolicy::Fail.resolve(None).is_err());
    /// assert_eq!(AbsentPolicy::Fail.resolve(Some(95.0)).unwrap(), Some(95.0));
    /// ```
    pub fn resolve(self, value: Option<f64>) -> Result<Option<f64>, PipelineError> {
        match (value, self) {
            (Some(v), _) => Ok(Some(v)),
            (None, AbsentPolicy::Empty) => Ok(None),
            (None, AbsentPolicy::Default(v)) => Ok(Some(v)),
            (None, AbsentPolicy::Fail) => Err(PipelineError::illegal_state(
                "no value present for aggregate over an empty sequence",
            )),
        }
    }
}

/// Arithmetic mean, or `None` when there is nothing to average.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Groups items by key. Only observed keys appear, each with at least one item.
pub fn group_by<T, K, I, F>(items: I, mut key: F) -> BTreeMap<K, Vec<T>>
where
    I: IntoIterator<Item = T>,
    K: Ord,
    F: FnMut(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}

/// Splits items by a predicate. Both `true` and `false` are always present.
pub fn partition_by<T, I, P>(items: I, mut predicate: P) -> BTreeMap<bool, Vec<T>>
where
    I: IntoIterator<Item = T>,
    P: FnMut(&T) -> bool,
{
    let mut parts = BTreeMap::from([(false, Vec::new()), (true, Vec::new())]);
    for item in items {
        let side = predicate(&item);
        parts.entry(side).or_default().push(item);
    }
    parts
}
