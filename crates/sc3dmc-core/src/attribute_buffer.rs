use crate::status::Status;

/// Smallest capacity (in elements) an attribute buffer grows to.
pub const DEFAULT_MIN_CAPACITY: usize = 32;

/// Growable storage of fixed-width elements.
///
/// Backs every per-vertex and per-face array of an [`IndexedFaceSet`].
/// The logical size is tracked independently of the capacity, and growth
/// goes through `try_reserve_exact` so an oversized request reports
/// `AllocationFailure` instead of aborting.
///
/// [`IndexedFaceSet`]: crate::mesh::IndexedFaceSet
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBuffer<T, const N: usize> {
    data: Vec<[T; N]>,
}

impl<T, const N: usize> Default for AttributeBuffer<T, N> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<T: Copy + Default, const N: usize> AttributeBuffer<T, N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(data: Vec<[T; N]>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn as_slice(&self) -> &[[T; N]] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [[T; N]] {
        &mut self.data
    }

    pub fn get(&self, index: usize) -> Option<&[T; N]> {
        self.data.get(index)
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Makes room for at least `min_capacity` elements using the
    /// doubling growth policy.
    pub fn reserve(&mut self, min_capacity: usize) -> Status {
        let capacity = self.data.capacity();
        if min_capacity <= capacity {
            return Ok(());
        }
        let new_capacity = DEFAULT_MIN_CAPACITY.max(capacity * 2).max(min_capacity);
        self.data.try_reserve_exact(new_capacity - self.data.len())?;
        Ok(())
    }

    pub fn push(&mut self, element: [T; N]) -> Status {
        if self.data.len() == self.data.capacity() {
            self.reserve(self.data.len() + 1)?;
        }
        self.data.push(element);
        Ok(())
    }

    /// Sets the logical size to `len` elements, filling new slots with
    /// default values.
    pub fn allocate(&mut self, len: usize) -> Status {
        if len > self.data.len() {
            // Exact sizing: the caller knows the final element count.
            self.data.try_reserve_exact(len - self.data.len())?;
        }
        self.data.resize(len, [T::default(); N]);
        Ok(())
    }

    pub fn into_vec(self) -> Vec<[T; N]> {
        self.data
    }
}

impl<T: Copy + Default, const N: usize> From<Vec<[T; N]>> for AttributeBuffer<T, N> {
    fn from(data: Vec<[T; N]>) -> Self {
        Self::from_vec(data)
    }
}
