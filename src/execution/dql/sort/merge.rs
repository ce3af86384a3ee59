use crate::errors::DatabaseError;
use crate::execution::dql::sort::comparator::{compare_keys, KeyValidator};
use crate::planner::operator::sort::SortField;
use crate::types::tuple::Tuple;
use crate::types::value::ValueRef;
use crate::utils::thread::CancellationToken;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

/// A row together with its evaluated sort keys.
pub(crate) type KeyedTuple = (Vec<ValueRef>, Tuple);

pub(crate) type KeyedStream = Box<dyn Iterator<Item = Result<KeyedTuple, DatabaseError>>>;

struct HeapEntry {
    keys: Vec<ValueRef>,
    tuple: Tuple,
    stream: usize,
    fields: Arc<[SortField]>,
}

impl Ord for HeapEntry {
    // reversed: `BinaryHeap` pops the greatest entry
    fn cmp(&self, other: &Self) -> Ordering {
        compare_keys(&other.keys, &self.keys, &self.fields)
            .then_with(|| other.stream.cmp(&self.stream))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

/// K-way merge of streams that are each ordered by `fields`.
///
/// Holds one row per stream. Equal keys come out in stream order, so merging
/// the runs of a stable sort keeps it stable. After the first error nothing
/// more is yielded.
pub(crate) struct MergingIter {
    streams: Vec<KeyedStream>,
    heap: BinaryHeap<HeapEntry>,
    fields: Arc<[SortField]>,
    validator: KeyValidator,
    cancel: CancellationToken,
    initialized: bool,
    pending_err: Option<DatabaseError>,
    finished: bool,
}

impl MergingIter {
    pub(crate) fn new(
        streams: Vec<KeyedStream>,
        fields: Arc<[SortField]>,
        cancel: CancellationToken,
    ) -> Self {
        MergingIter {
            heap: BinaryHeap::with_capacity(streams.len()),
            streams,
            fields,
            validator: KeyValidator::default(),
            cancel,
            initialized: false,
            pending_err: None,
            finished: false,
        }
    }

    fn pull(&mut self, stream: usize) -> Result<(), DatabaseError> {
        let Some(next) = self.streams.get_mut(stream).and_then(Iterator::next) else {
            return Ok(());
        };
        let (keys, tuple) = next?;
        self.validator.validate(&keys)?;

        self.heap.push(HeapEntry {
            keys,
            tuple,
            stream,
            fields: self.fields.clone(),
        });
        Ok(())
    }

    fn fail(&mut self, err: DatabaseError) -> Option<Result<Tuple, DatabaseError>> {
        self.finished = true;
        self.heap.clear();
        self.streams.clear();

        Some(Err(err))
    }
}

impl Iterator for MergingIter {
    type Item = Result<Tuple, DatabaseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(err) = self.pending_err.take() {
            return self.fail(err);
        }
        if let Err(err) = self.cancel.check() {
            return self.fail(err);
        }
        if !self.initialized {
            self.initialized = true;

            for stream in 0..self.streams.len() {
                if let Err(err) = self.pull(stream) {
                    return self.fail(err);
                }
            }
        }
        let Some(HeapEntry { tuple, stream, .. }) = self.heap.pop() else {
            self.finished = true;
            return None;
        };
        if let Err(err) = self.pull(stream) {
            self.pending_err = Some(err);
        }

        Some(Ok(tuple))
    }
}
