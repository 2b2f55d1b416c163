/// Immutable descriptor of a [`DistribArray`](crate::DistribArray)'s partition
/// sizes.
///
/// A `Shape` pairs a fixed capacity with a current length for each partition.
/// It carries no backing data and is cheap to clone; callers snapshot a
/// `Shape` from an array and can hold onto it after the array has moved on.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    lens: Vec<i64>,
    caps: Vec<i64>,
}

impl Shape {
    /// Builds a shape from explicit per-partition capacities. All lengths
    /// start at zero.
    pub fn new(caps: impl Into<Vec<i64>>) -> Self {
        let caps = caps.into();
        let lens = vec![0; caps.len()];
        Self { lens, caps }
    }

    /// Builds a shape with `n` partitions, each with capacity `cap`.
    pub fn uniform(cap: i64, n: usize) -> Self {
        Self::new(vec![cap; n])
    }

    /// Reconstructs a shape from raw `lens`/`caps` pairs, e.g. when loading
    /// `meta.json`. Panics if the two vectors differ in length.
    pub fn from_parts(lens: Vec<i64>, caps: Vec<i64>) -> Self {
        assert_eq!(lens.len(), caps.len(), "lens and caps must be equal length");
        Self { lens, caps }
    }

    pub fn n_part(&self) -> usize {
        self.caps.len()
    }

    pub fn len(&self, i: usize) -> i64 {
        self.lens[i]
    }

    pub fn cap(&self, i: usize) -> i64 {
        self.caps[i]
    }

    /// `true` when the shape has no partitions at all (a legal, empty array).
    pub fn is_empty(&self) -> bool {
        self.caps.is_empty()
    }

    pub fn total_cap(&self) -> i64 {
        self.caps.iter().sum()
    }

    pub fn total_len(&self) -> i64 {
        self.lens.iter().sum()
    }

    pub fn lens(&self) -> &[i64] {
        &self.lens
    }

    pub fn caps(&self) -> &[i64] {
        &self.caps
    }

    /// Byte offset of the first byte of partition `i` within the
    /// concatenated data blob (`Σ_{j<i} cap[j]`).
    pub fn part_start(&self, i: usize) -> i64 {
        self.caps[..i].iter().sum()
    }

    pub(crate) fn set_len(&mut self, i: usize, len: i64) {
        self.lens[i] = len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_starts_at_zero_length() {
        let shape = Shape::uniform(16, 4);
        assert_eq!(shape.n_part(), 4);
        for i in 0..4 {
            assert_eq!(shape.len(i), 0);
            assert_eq!(shape.cap(i), 16);
        }
    }

    #[test]
    fn empty_shape_is_legal() {
        let shape = Shape::new(Vec::<i64>::new());
        assert_eq!(shape.n_part(), 0);
        assert!(shape.is_empty());
        assert_eq!(shape.total_cap(), 0);
    }

    #[test]
    fn part_start_sums_preceding_caps() {
        let shape = Shape::new(vec![4, 8, 2]);
        assert_eq!(shape.part_start(0), 0);
        assert_eq!(shape.part_start(1), 4);
        assert_eq!(shape.part_start(2), 12);
    }
}
