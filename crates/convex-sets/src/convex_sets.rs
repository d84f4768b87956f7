//! Owning, ordered container of boxed convex sets.
//!
//! - Cloning the container deep-clones every element through `clone_box`;
//!   moving it moves the boxes, never the payload.
//! - `IntoConvexSet` decides per argument whether to move or to clone once:
//!   owned sets and boxes move, references clone exactly once.
//! - `make_convex_sets!` builds a container from any mixture, in call order.

use std::ops::Index;

use crate::convex_hull::ConvexHull;
use crate::convex_set::ConvexSet;
use crate::sets::{HPolyhedron, Hyperrectangle, Point};

/// Ordered sequence of exclusively owned convex sets.
#[derive(Debug, Default)]
pub struct ConvexSets {
    sets: Vec<Box<dyn ConvexSet>>,
}

impl ConvexSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            sets: Vec::with_capacity(n),
        }
    }

    /// Append an owned set (moved, not copied).
    pub fn push(&mut self, set: Box<dyn ConvexSet>) {
        self.sets.push(set);
    }

    /// Append anything convertible and return a view of the stored element.
    pub fn emplace_back(&mut self, set: impl IntoConvexSet) -> &dyn ConvexSet {
        self.sets.push(set.into_convex_set());
        let last = self.sets.len() - 1;
        &*self.sets[last]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&dyn ConvexSet> {
        self.sets.get(i).map(|s| &**s)
    }

    /// Mutable access to the boxed element, e.g. to swap it out.
    pub fn get_mut(&mut self, i: usize) -> Option<&mut Box<dyn ConvexSet>> {
        self.sets.get_mut(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ConvexSet> + '_ {
        self.sets.iter().map(|s| &**s)
    }
}

impl Clone for ConvexSets {
    fn clone(&self) -> Self {
        Self {
            sets: self.sets.iter().map(|s| s.clone_box()).collect(),
        }
    }
}

impl Index<usize> for ConvexSets {
    type Output = dyn ConvexSet;
    fn index(&self, i: usize) -> &Self::Output {
        &*self.sets[i]
    }
}

impl From<Vec<Box<dyn ConvexSet>>> for ConvexSets {
    fn from(sets: Vec<Box<dyn ConvexSet>>) -> Self {
        Self { sets }
    }
}

impl FromIterator<Box<dyn ConvexSet>> for ConvexSets {
    fn from_iter<I: IntoIterator<Item = Box<dyn ConvexSet>>>(iter: I) -> Self {
        Self {
            sets: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ConvexSets {
    type Item = Box<dyn ConvexSet>;
    type IntoIter = std::vec::IntoIter<Box<dyn ConvexSet>>;
    fn into_iter(self) -> Self::IntoIter {
        self.sets.into_iter()
    }
}

/// Conversion into an owned, boxed set.
///
/// - Crate set types and `Box<dyn ConvexSet>`: moved.
/// - `&T` (any set, including `dyn ConvexSet`) and `&Box<dyn ConvexSet>`:
///   cloned exactly once.
///
/// Set types defined elsewhere move in as `Box<dyn ConvexSet>`.
pub trait IntoConvexSet {
    fn into_convex_set(self) -> Box<dyn ConvexSet>;
}

impl<T: ConvexSet + ?Sized> IntoConvexSet for &T {
    #[inline]
    fn into_convex_set(self) -> Box<dyn ConvexSet> {
        self.clone_box()
    }
}

impl IntoConvexSet for Box<dyn ConvexSet> {
    #[inline]
    fn into_convex_set(self) -> Box<dyn ConvexSet> {
        self
    }
}

impl IntoConvexSet for &Box<dyn ConvexSet> {
    #[inline]
    fn into_convex_set(self) -> Box<dyn ConvexSet> {
        self.clone_box()
    }
}

// A blanket `impl<T: ConvexSet> for T` would overlap with `&T` (downstream
// crates may implement `ConvexSet` for references), so owned values are listed.
macro_rules! impl_into_convex_set {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IntoConvexSet for $ty {
                #[inline]
                fn into_convex_set(self) -> Box<dyn ConvexSet> {
                    Box::new(self)
                }
            }
        )+
    };
}

impl_into_convex_set!(Point, Hyperrectangle, HPolyhedron, ConvexHull);

/// Build a `ConvexSets` from owned sets, boxes and references, in order.
///
/// ```ignore
/// let sets = make_convex_sets!(&point, rectangle.clone(), boxed);
/// ```
#[macro_export]
macro_rules! make_convex_sets {
    () => {
        $crate::ConvexSets::new()
    };
    ($($set:expr),+ $(,)?) => {{
        let mut sets = $crate::ConvexSets::new();
        $( sets.push($crate::IntoConvexSet::into_convex_set($set)); )+
        sets
    }};
}
