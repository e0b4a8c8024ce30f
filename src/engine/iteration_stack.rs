/// Per-thread record of one point's iterate sequence.
///
/// Index 0 holds the starting point, index `i` the value after `i` map
/// applications. The normal computation replays this record, so it must
/// survive between the iterate call and the normal call on the same thread.

use crate::formulas::Vec4D;

/// Four component-major scratch arrays, one per 4D coordinate.
#[derive(Clone, Debug, Default)]
pub struct IterationStack {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub w: Vec<f64>,
}

impl IterationStack {
    /// Grow every array to `len + 1` entries. Never shrinks, so calling it
    /// with the running scene maximum is cheap once the size is reached.
    pub fn allocate(&mut self, len: usize) {
        let needed = len + 1;
        if self.x.len() >= needed {
            return;
        }
        self.x.resize(needed, 0.0);
        self.y.resize(needed, 0.0);
        self.z.resize(needed, 0.0);
        self.w.resize(needed, 0.0);
    }

    /// Release all storage. Safe on a stack that was never allocated.
    pub fn free(&mut self) {
        self.x = Vec::new();
        self.y = Vec::new();
        self.z = Vec::new();
        self.w = Vec::new();
    }

    /// Number of entries each array can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.x.len()
    }

    #[inline(always)]
    pub fn get(&self, i: usize) -> Vec4D {
        Vec4D {
            x: self.x[i],
            y: self.y[i],
            z: self.z[i],
            w: self.w[i],
        }
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, v: &Vec4D) {
        self.x[i] = v.x;
        self.y[i] = v.y;
        self.z[i] = v.z;
        self.w[i] = v.w;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_grows_to_len_plus_one() {
        let mut s = IterationStack::default();
        assert_eq!(s.capacity(), 0);
        s.allocate(20);
        assert_eq!(s.capacity(), 21);
        assert_eq!(s.w.len(), 21);
    }

    #[test]
    fn test_allocate_never_shrinks() {
        let mut s = IterationStack::default();
        s.allocate(30);
        s.set(30, &Vec4D::new(1.0, 2.0, 3.0, 4.0));
        s.allocate(5);
        assert_eq!(s.capacity(), 31);
        assert_eq!(s.get(30), Vec4D::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_free() {
        let mut s = IterationStack::default();
        s.free();
        assert_eq!(s.capacity(), 0);
        s.allocate(8);
        s.free();
        assert_eq!(s.capacity(), 0);
        assert!(s.y.is_empty());
    }
}
