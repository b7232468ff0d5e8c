use std::{cmp::Ordering, collections::BTreeMap, fmt};

use tracing::{debug, trace};

use crate::{
    error::PipelineError,
    stream::{
        collectors,
        source::{SharedSource, SourceMode},
    },
};

type Elements<'a, T> = Box<dyn Iterator<Item = T> + 'a>;
type Deferred<'a, T> = Box<dyn FnOnce() -> Elements<'a, T> + 'a>;

/// Boxed predicate for the optional-argument entry points
pub type Predicate<'a, T> = Box<dyn FnMut(&T) -> bool + 'a>;

/// Boxed comparator for the optional-argument entry points
pub type Comparator<'a, T> = Box<dyn FnMut(&T, &T) -> Ordering + 'a>;

/// A one-shot, declarative pipeline over a sequence of records.
///
/// Stages (`filter`, `expand`, `map`, `sorted_by`, `limit`, `skip`) only
/// describe work; nothing is read from the source until a terminal operation
/// (`collect`, `for_each`, `count`, `average`, `group_by`, ...) runs. After the
/// first terminal the pipeline is consumed and every further terminal fails
/// with [`PipelineError::IllegalState`].
///
/// # Examples
///
/// ```
/// use sluice::stream::Pipeline;
///
/// let names = vec!["John", "Jane", "Mary", "Harry", "Joe"];
/// let mut pipeline = Pipeline::from_vec(names)
///     .filter(|name| name.len() == 4)
///     .sorted()
///     .limit(2);
///
/// assert_eq!(pipeline.collect().unwrap(), vec!["Jane", "John"]);
/// assert!(pipeline.collect().unwrap_err().is_illegal_state());
/// ```
pub struct Pipeline<'a, T> {
    /// `None` once a terminal operation has run
    source: Option<Deferred<'a, T>>,
}

impl<T> fmt::Debug for Pipeline<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("consumed", &self.source.is_none())
            .finish()
    }
}

impl<'a, T: 'a> Pipeline<'a, T> {
    /// Pipeline that owns its elements
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::deferred(move || Box::new(items.into_iter()) as Elements<'a, T>)
    }

    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Pipeline over shared backing storage. See [`SourceMode`] for how
    /// modifications made after this call are treated.
    pub fn over(source: &SharedSource<T>, mode: SourceMode) -> Self
    where
        T: Clone,
    {
        match mode {
            SourceMode::Snapshot => Self::from_vec(source.to_vec()),
            SourceMode::Live => {
                let source = source.clone();
                Self::deferred(move || Box::new(source.to_vec().into_iter()) as Elements<'a, T>)
            }
        }
    }

    fn deferred<F>(source: F) -> Self
    where
        F: FnOnce() -> Elements<'a, T> + 'a,
    {
        Pipeline {
            source: Some(Box::new(source)),
        }
    }

    fn then<U, F>(self, stage: F) -> Pipeline<'a, U>
    where
        U: 'a,
        F: FnOnce(Elements<'a, T>) -> Elements<'a, U> + 'a,
    {
        Pipeline {
            source: self
                .source
                .map(|upstream| Box::new(move || stage(upstream())) as Deferred<'a, U>),
        }
    }

    /// Whether a terminal operation has already run
    pub fn is_consumed(&self) -> bool {
        self.source.is_none()
    }

    // ========================================
    // Stages
    // ========================================

    /// Keeps the elements matching `predicate`, in order.
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + 'a,
    {
        self.then(move |elements| {
            trace!("stage: filter");
            Box::new(elements.filter(predicate)) as Elements<'a, T>
        })
    }

    /// Replaces every element with the children `extract` yields for it,
    /// flattening one level of nesting.
    pub fn expand<U, I, F>(self, extract: F) -> Pipeline<'a, U>
    where
        U: 'a,
        I: IntoIterator<Item = U> + 'a,
        I::IntoIter: 'a,
        F: FnMut(T) -> I + 'a,
    {
        self.then(move |elements| {
            trace!("stage: expand");
            Box::new(elements.flat_map(extract)) as Elements<'a, U>
        })
    }

    pub fn map<U, F>(self, transform: F) -> Pipeline<'a, U>
    where
        U: 'a,
        F: FnMut(T) -> U + 'a,
    {
        self.then(move |elements| {
            trace!("stage: map");
            Box::new(elements.map(transform)) as Elements<'a, U>
        })
    }

    /// Stable sort by `comparator`: elements comparing equal keep their order.
    pub fn sorted_by<C>(self, comparator: C) -> Self
    where
        C: FnMut(&T, &T) -> Ordering + 'a,
    {
        self.then(move |elements| {
            trace!("stage: sort");
            let mut buffered: Vec<T> = elements.collect();
            buffered.sort_by(comparator);
            Box::new(buffered.into_iter()) as Elements<'a, T>
        })
    }

    /// Stable sort by an extracted key
    pub fn sorted_by_key<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: FnMut(&T) -> K + 'a,
    {
        self.then(move |elements| {
            trace!("stage: sort by key");
            let mut buffered: Vec<T> = elements.collect();
            buffered.sort_by_key(key);
            Box::new(buffered.into_iter()) as Elements<'a, T>
        })
    }

    /// Natural ordering
    pub fn sorted(self) -> Self
    where
        T: Ord,
    {
        self.sorted_by(T::cmp)
    }

    pub fn limit(self, n: usize) -> Self {
        self.then(move |elements| Box::new(elements.take(n)) as Elements<'a, T>)
    }

    pub fn skip(self, n: usize) -> Self {
        self.then(move |elements| Box::new(elements.skip(n)) as Elements<'a, T>)
    }

    /// Applies an optional filter and an optional ordering.
    ///
    /// A missing predicate keeps everything; a missing comparator leaves the
    /// elements in source order.
    pub fn select(self, filter: Option<Predicate<'a, T>>, order: Option<Comparator<'a, T>>) -> Self {
        let mut pipeline = self;
        if let Some(predicate) = filter {
            pipeline = pipeline.filter(predicate);
        }
        if let Some(comparator) = order {
            pipeline = pipeline.sorted_by(comparator);
        }
        pipeline
    }

    /// Like [`filter`](Self::filter), for callers whose predicate may be absent.
    pub fn try_filter(self, predicate: Option<Predicate<'a, T>>) -> Result<Self, PipelineError> {
        match predicate {
            Some(predicate) => Ok(self.filter(predicate)),
            None => Err(PipelineError::invalid_argument("filter requires a predicate")),
        }
    }

    /// Like [`sorted_by`](Self::sorted_by), for callers whose comparator may be absent.
    pub fn try_sorted_by(self, comparator: Option<Comparator<'a, T>>) -> Result<Self, PipelineError> {
        match comparator {
            Some(comparator) => Ok(self.sorted_by(comparator)),
            None => Err(PipelineError::invalid_argument("sort requires a comparator")),
        }
    }

    // ========================================
    // Terminal operations
    // ========================================

    fn consume(&mut self, operation: &'static str) -> Result<Elements<'a, T>, PipelineError> {
        match self.source.take() {
            Some(source) => {
                debug!(operation, "running terminal operation");
                Ok(source())
            }
            None => Err(PipelineError::illegal_state(format!(
                "cannot run {}: pipeline has already been operated upon or closed",
                operation
            ))),
        }
    }

    pub fn collect(&mut self) -> Result<Vec<T>, PipelineError> {
        Ok(self.consume("collect")?.collect())
    }

    /// Runs `action` on every element for its effect.
    pub fn for_each<F>(&mut self, action: F) -> Result<(), PipelineError>
    where
        F: FnMut(T),
    {
        self.consume("for_each")?.for_each(action);
        Ok(())
    }

    pub fn count(&mut self) -> Result<usize, PipelineError> {
        Ok(self.consume("count")?.count())
    }

    /// Folds every element into `identity` with `op`.
    pub fn reduce<F>(&mut self, identity: T, op: F) -> Result<T, PipelineError>
    where
        F: FnMut(T, T) -> T,
    {
        Ok(self.consume("reduce")?.fold(identity, op))
    }

    pub fn any_match<P>(&mut self, mut predicate: P) -> Result<bool, PipelineError>
    where
        P: FnMut(&T) -> bool,
    {
        Ok(self.consume("any_match")?.any(|item| predicate(&item)))
    }

    pub fn all_match<P>(&mut self, mut predicate: P) -> Result<bool, PipelineError>
    where
        P: FnMut(&T) -> bool,
    {
        Ok(self.consume("all_match")?.all(|item| predicate(&item)))
    }

    /// Mean of the extracted numbers, `None` when the pipeline is empty.
    ///
    /// ```
    /// use sluice::stream::Pipeline;
    ///
    /// assert_eq!(Pipeline::from_vec(vec![90, 100]).average(|n| *n as f64).unwrap(), Some(95.0));
    /// assert_eq!(Pipeline::<i32>::empty().average(|n| *n as f64).unwrap(), None);
    /// ```
    pub fn average<F>(&mut self, mut extract: F) -> Result<Option<f64>, PipelineError>
    where
        F: FnMut(&T) -> f64,
    {
        let elements = self.consume("average")?;
        Ok(collectors::mean(elements.map(|item| extract(&item))))
    }

    pub fn sum<F>(&mut self, mut extract: F) -> Result<f64, PipelineError>
    where
        F: FnMut(&T) -> f64,
    {
        Ok(self.consume("sum")?.map(|item| extract(&item)).sum())
    }

    /// Concatenates the elements' display forms with `separator`.
    pub fn join(&mut self, separator: &str) -> Result<String, PipelineError>
    where
        T: fmt::Display,
    {
        let parts: Vec<String> = self.consume("join")?.map(|item| item.to_string()).collect();
        Ok(parts.join(separator))
    }

    /// Groups elements by key. Only keys that occur are present.
    pub fn group_by<K, F>(&mut self, key: F) -> Result<BTreeMap<K, Vec<T>>, PipelineError>
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        Ok(collectors::group_by(self.consume("group_by")?, key))
    }

    /// Splits elements by `predicate`. Both `true` and `false` are always present.
    pub fn partition_by<P>(&mut self, predicate: P) -> Result<BTreeMap<bool, Vec<T>>, PipelineError>
    where
        P: FnMut(&T) -> bool,
    {
        Ok(collectors::partition_by(self.consume("partition_by")?, predicate))
    }
}

impl<'a, T: 'a> From<Vec<T>> for Pipeline<'a, T> {
    fn from(items: Vec<T>) -> Self {
        Pipeline::from_vec(items)
    }
}

impl<'a, T: 'a> FromIterator<T> for Pipeline<'a, T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Pipeline::from_vec(iter.into_iter().collect())
    }
}
