// Persistent lists are trees of reference counted nodes. Cloning a list only clones the handle to
// its root. Writes copy the nodes on the path from the root to the modified leaf and share the rest,
// so older versions of a list are never affected by writes to newer ones.

use core::{fmt::Debug, marker::PhantomData};

use derivative::Derivative;
use ethereum_types::H256;
use hashing::ZERO_HASHES;
use triomphe::Arc;
use typenum::Unsigned;

use crate::{
    error::{IndexError, PushError},
    hc::Hc,
    merkle_tree::{self, depth_for_limit},
    porcelain::SszHash,
};

type Link<T> = Arc<Hc<Node<T>>>;

#[derive(Clone, PartialEq, Eq, Debug)]
enum Node<T> {
    Internal {
        left: Link<T>,
        right: Option<Link<T>>,
        height: u8,
    },
    // Leaves hold up to `T::PACKING_FACTOR` values. Only the last leaf may be partially filled.
    Leaf {
        bundle: Vec<T>,
    },
}

impl<T: SszHash> SszHash for Node<T> {
    fn hash_tree_root(&self) -> H256 {
        match self {
            Self::Internal {
                left,
                right,
                height,
            } => {
                let right = right.as_ref().map_or_else(
                    || ZERO_HASHES[usize::from(*height) - 1],
                    |right| right.hash_tree_root(),
                );

                hashing::hash_256_256(left.hash_tree_root(), right)
            }
            Self::Leaf { bundle } => {
                if T::PACKING_FACTOR == 1 {
                    bundle
                        .first()
                        .expect("leaves are never empty")
                        .hash_tree_root()
                } else {
                    merkle_tree::pack_bundle(bundle)
                }
            }
        }
    }
}

impl<T> Node<T> {
    const fn height(&self) -> u8 {
        match self {
            Self::Internal { height, .. } => *height,
            Self::Leaf { .. } => 0,
        }
    }

    fn path_to_leaf(height: u8, value: T) -> Link<T> {
        let node = match height {
            0 => Self::Leaf {
                bundle: vec![value],
            },
            _ => Self::Internal {
                left: Self::path_to_leaf(height - 1, value),
                right: None,
                height,
            },
        };

        Arc::new(Hc::from(node))
    }
}

#[derive(Derivative)]
#[derivative(
    Clone(bound = ""),
    PartialEq(bound = "T: PartialEq"),
    Eq(bound = "T: Eq"),
    Debug(bound = "T: Debug"),
    Default(bound = "")
)]
pub struct PersistentList<T, N> {
    root: Option<Link<T>>,
    length: usize,
    #[derivative(Debug = "ignore")]
    phantom: PhantomData<N>,
}

impl<T: Clone + SszHash, N: Unsigned> PersistentList<T, N> {
    pub fn try_from_iter(values: impl IntoIterator<Item = T>) -> Result<Self, PushError> {
        let mut list = Self::default();

        for value in values {
            list.push(value)?;
        }

        Ok(list)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn get(&self, index: usize) -> Result<&T, IndexError> {
        self.validate_index(index)?;

        let bundle_index = index / T::PACKING_FACTOR;
        let mut node = self.root.as_ref().expect("list is not empty");

        loop {
            match &***node {
                Node::Internal {
                    left,
                    right,
                    height,
                } => {
                    node = if goes_right(bundle_index, *height) {
                        right.as_ref().expect("index is in bounds")
                    } else {
                        left
                    };
                }
                Node::Leaf { bundle } => {
                    return Ok(&bundle[index % T::PACKING_FACTOR]);
                }
            }
        }
    }

    /// Returns a mutable reference to the value at `index`.
    ///
    /// Nodes on the path to the value are copied if they are shared with other lists.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, IndexError> {
        self.validate_index(index)?;

        let root = self.root.as_mut().expect("list is not empty");

        Ok(value_mut(root, index / T::PACKING_FACTOR, index % T::PACKING_FACTOR))
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), IndexError> {
        *self.get_mut(index)? = value;
        Ok(())
    }

    pub fn push(&mut self, value: T) -> Result<(), PushError> {
        if self.length >= N::USIZE {
            return Err(PushError::ListFull { maximum: N::USIZE });
        }

        let bundle_index = self.length / T::PACKING_FACTOR;
        let starts_bundle = self.length % T::PACKING_FACTOR == 0;

        match self.root.take() {
            None => self.root = Some(Node::path_to_leaf(0, value)),
            Some(root) if starts_bundle && bundle_index == 1 << root.height() => {
                let height = root.height() + 1;

                let node = Node::Internal {
                    left: root,
                    right: Some(Node::path_to_leaf(height - 1, value)),
                    height,
                };

                self.root = Some(Arc::new(Hc::from(node)));
            }
            Some(mut root) => {
                insert(&mut root, bundle_index, value);
                self.root = Some(root);
            }
        }

        self.length += 1;

        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        let mut root = self.root.take()?;
        let (value, emptied) = remove_last(&mut root, (self.length - 1) / T::PACKING_FACTOR);

        self.length -= 1;

        if !emptied {
            self.root = Some(collapse(root));
        }

        Some(value)
    }

    pub fn update(&mut self, mut modifier: impl FnMut(&mut T)) {
        for index in 0..self.length {
            let root = self.root.as_mut().expect("list is not empty");
            modifier(value_mut(root, index / T::PACKING_FACTOR, index % T::PACKING_FACTOR));
        }
    }

    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            stack: self.root.iter().map(|root| &***root).collect(),
            bundle: Default::default(),
            remaining: self.length,
        }
    }

    /// Root of the contents without the length mixed in.
    pub(crate) fn contents_root(&self) -> H256 {
        let limit = (N::U64).div_ceil(T::PACKING_FACTOR as u64);
        let max_depth = depth_for_limit(limit);

        let Some(root) = self.root.as_ref() else {
            return ZERO_HASHES[max_depth];
        };

        let height = usize::from(root.height());

        (height..max_depth).fold(root.hash_tree_root(), |subroot, height| {
            hashing::hash_256_256(subroot, ZERO_HASHES[height])
        })
    }

    const fn validate_index(&self, index: usize) -> Result<(), IndexError> {
        if index < self.length {
            Ok(())
        } else {
            Err(IndexError::OutOfBounds {
                index,
                length: self.length,
            })
        }
    }
}

impl<T: Clone + SszHash, N: Unsigned> SszHash for PersistentList<T, N> {
    fn hash_tree_root(&self) -> H256 {
        merkle_tree::mix_in_length(self.contents_root(), self.length)
    }
}

impl<'list, T: Clone + SszHash, N: Unsigned> IntoIterator for &'list PersistentList<T, N> {
    type Item = &'list T;
    type IntoIter = Iter<'list, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'list, T> {
    stack: Vec<&'list Node<T>>,
    bundle: core::slice::Iter<'list, T>,
    remaining: usize,
}

impl<'list, T> Iterator for Iter<'list, T> {
    type Item = &'list T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.bundle.next() {
                self.remaining -= 1;
                return Some(value);
            }

            match self.stack.pop()? {
                Node::Internal { left, right, .. } => {
                    if let Some(right) = right {
                        self.stack.push(right);
                    }

                    self.stack.push(left);
                }
                Node::Leaf { bundle } => self.bundle = bundle.iter(),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

const fn goes_right(bundle_index: usize, height: u8) -> bool {
    (bundle_index >> (height - 1)) & 1 == 1
}

fn value_mut<T: Clone>(link: &mut Link<T>, bundle_index: usize, position: usize) -> &mut T {
    match &mut **Arc::make_mut(link) {
        Node::Internal {
            left,
            right,
            height,
        } => {
            let child = if goes_right(bundle_index, *height) {
                right.as_mut().expect("index is in bounds")
            } else {
                left
            };

            value_mut(child, bundle_index, position)
        }
        Node::Leaf { bundle } => &mut bundle[position],
    }
}

fn insert<T: Clone>(link: &mut Link<T>, bundle_index: usize, value: T) {
    match &mut **Arc::make_mut(link) {
        Node::Internal {
            left,
            right,
            height,
        } => {
            if !goes_right(bundle_index, *height) {
                return insert(left, bundle_index, value);
            }

            match right {
                Some(right) => insert(right, bundle_index, value),
                None => *right = Some(Node::path_to_leaf(*height - 1, value)),
            }
        }
        Node::Leaf { bundle } => bundle.push(value),
    }
}

// Returns the removed value and whether the subtree rooted at `link` became empty.
fn remove_last<T: Clone>(link: &mut Link<T>, bundle_index: usize) -> (T, bool) {
    match &mut **Arc::make_mut(link) {
        Node::Internal {
            left,
            right,
            height,
        } => {
            if !goes_right(bundle_index, *height) {
                return remove_last(left, bundle_index);
            }

            let subtree = right.as_mut().expect("last index is in bounds");
            let (value, emptied) = remove_last(subtree, bundle_index);

            if emptied {
                *right = None;
            }

            (value, false)
        }
        Node::Leaf { bundle } => {
            let value = bundle.pop().expect("leaves are never empty");
            (value, bundle.is_empty())
        }
    }
}

// Removes internal nodes at the top of the tree that have no right subtree.
fn collapse<T>(mut root: Link<T>) -> Link<T> {
    while let Node::Internal {
        left, right: None, ..
    } = &**root
    {
        root = Arc::clone(left);
    }

    root
}
