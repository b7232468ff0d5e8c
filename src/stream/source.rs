use std::{cell::RefCell, rc::Rc};

/// How a pipeline built over a [`SharedSource`] sees its backing storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    /// Elements are copied when the pipeline is created. Later pushes are not seen.
    #[default]
    Snapshot,

    /// Elements are read when the terminal operation runs, so pushes made
    /// between creation and the terminal show up in the result.
    Live,
}

/// Mutable backing collection that pipelines can be built over.
///
/// Cloning the handle shares the same storage.
///
/// # Examples
///
/// ```
/// use sluice::stream::{Pipeline, SharedSource, SourceMode};
///
/// let names = SharedSource::new(vec!["Jane".to_string()]);
/// let mut live = Pipeline::over(&names, SourceMode::Live);
/// let mut snapshot = Pipeline::over(&names, SourceMode::Snapshot);
/// names.push("John".to_string());
///
/// assert_eq!(live.count().unwrap(), 2);
/// assert_eq!(snapshot.count().unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct SharedSource<T> {
    items: Rc<RefCell<Vec<T>>>,
}

impl<T> Clone for SharedSource<T> {
    fn clone(&self) -> Self {
        SharedSource {
            items: Rc::clone(&self.items),
        }
    }
}

impl<T> SharedSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        SharedSource {
            items: Rc::new(RefCell::new(items)),
        }
    }

    pub fn push(&self, item: T) {
        self.items.borrow_mut().push(item);
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl<T: Clone> SharedSource<T> {
    /// Copy of the current contents
    pub fn to_vec(&self) -> Vec<T> {
        self.items.borrow().clone()
    }
}

impl<T> From<Vec<T>> for SharedSource<T> {
    fn from(items: Vec<T>) -> Self {
        SharedSource::new(items)
    }
}
