use coitrees::{BasicCOITree, GenericInterval, Interval, IntervalTree};

use crate::{error::GWindowsError, PositionOffset};

use super::Annotation;

/// A [`coitrees::BasicCOITree`] interval tree over a single chromosome's annotations.
///
/// Each tree node stores the index of its annotation in the chromosome's annotation
/// slice, so queries visit annotation indices.
pub struct AnnotationTree {
    tree: BasicCOITree<usize, usize>,
}

impl std::fmt::Debug for AnnotationTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationTree")
            .field("number of annotations:", &self.tree.len())
            .finish()
    }
}

impl AnnotationTree {
    /// Build a tree from a chromosome's annotations.
    pub fn new(annotations: &[Annotation]) -> Result<Self, GWindowsError> {
        let mut intervals = Vec::with_capacity(annotations.len());
        for (index, annotation) in annotations.iter().enumerate() {
            // coitrees uses i32 positions and right-inclusive "last"
            let first: i32 = annotation.start.try_into().map_err(|_| {
                GWindowsError::InvalidWindow(format!(
                    "annotation start {} exceeds the indexable range",
                    annotation.start
                ))
            })?;
            let last: i32 = (annotation.end - 1).try_into().map_err(|_| {
                GWindowsError::InvalidWindow(format!(
                    "annotation end {} exceeds the indexable range",
                    annotation.end
                ))
            })?;
            intervals.push(Interval::new(first, last, index));
        }
        let tree = BasicCOITree::new(&intervals);
        Ok(Self { tree })
    }

    /// Visit the index of every annotation overlapping `[start, end)`.
    pub fn query<F>(&self, start: PositionOffset, end: PositionOffset, mut visit: F)
    where
        F: FnMut(usize),
    {
        if end <= start {
            return;
        }
        let first = clamp_i32(start);
        let last = clamp_i32(end - 1);
        self.tree.query(first, last, |node| visit(*node.metadata()));
    }

    /// Return the number of annotations in this tree.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Return whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn clamp_i32(value: PositionOffset) -> i32 {
    value.clamp(i32::MIN as PositionOffset, i32::MAX as PositionOffset) as i32
}
