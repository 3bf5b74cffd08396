//! Reduced cost matrices.
//!
//! A [`CostMatrix`] is a dense `n x n` table stored row-major, row = from and
//! column = to. After a reduction pass every row and column holding at least
//! one finite entry has minimum zero, and the subtracted minima are a lower
//! bound on what any completion of the partial tour still has to pay.

use crate::instance::TspInstance;

#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    n: usize,
    data: Vec<f64>,
}

impl CostMatrix {
    /// Root matrix of an instance: all pairwise costs, infinite diagonal.
    pub fn from_instance(instance: &TspInstance) -> Self {
        let n = instance.dimension;
        let mut data = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                data.push(if i == j { f64::INFINITY } else { instance.cost(i, j) });
            }
        }
        CostMatrix { n, data }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.n + to]
    }

    #[inline]
    fn set(&mut self, from: usize, to: usize, value: f64) {
        self.data[from * self.n + to] = value;
    }

    fn row(&self, from: usize) -> &[f64] {
        &self.data[from * self.n..(from + 1) * self.n]
    }

    /// Commit edge `(from, to)` and reduce the remainder.
    ///
    /// The parent is left untouched; the returned child matrix is a private
    /// copy. The returned bound is `edge cost + reduction + inherited`, and is
    /// infinite when the edge does not exist in this matrix.
    pub fn reduce(&self, from: usize, to: usize, inherited: f64) -> (CostMatrix, f64) {
        let edge_cost = self.get(from, to);
        let mut child = self.clone();
        if !edge_cost.is_finite() {
            return (child, f64::INFINITY);
        }

        child.set(to, from, f64::INFINITY);
        for k in 0..self.n {
            child.set(from, k, f64::INFINITY);
            child.set(k, to, f64::INFINITY);
        }

        let reduction = child.reduce_rows() + child.reduce_columns();
        (child, edge_cost + reduction + inherited)
    }

    /// Subtract each row's minimum from that row, returning the total subtracted.
    pub fn reduce_rows(&mut self) -> f64 {
        let mut total = 0.0;
        for i in 0..self.n {
            let min = self.row(i).iter().cloned().fold(f64::INFINITY, f64::min);
            if min.is_finite() && min > 0.0 {
                total += min;
                for v in &mut self.data[i * self.n..(i + 1) * self.n] {
                    *v -= min;
                }
            }
        }
        total
    }

    /// Subtract each column's minimum from that column, returning the total subtracted.
    pub fn reduce_columns(&mut self) -> f64 {
        let mut total = 0.0;
        for j in 0..self.n {
            let min = (0..self.n)
                .map(|i| self.get(i, j))
                .fold(f64::INFINITY, f64::min);
            if min.is_finite() && min > 0.0 {
                total += min;
                for i in 0..self.n {
                    let v = self.get(i, j);
                    self.set(i, j, v - min);
                }
            }
        }
        total
    }

    /// Every row and column with a finite entry has minimum zero.
    pub fn is_reduced(&self) -> bool {
        let zero_min = |min: f64| !min.is_finite() || min == 0.0;
        let rows = (0..self.n).all(|i| zero_min(self.row(i).iter().cloned().fold(f64::INFINITY, f64::min)));
        let cols = (0..self.n).all(|j| {
            zero_min((0..self.n).map(|i| self.get(i, j)).fold(f64::INFINITY, f64::min))
        });
        rows && cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INF: f64 = f64::INFINITY;

    fn instance(matrix: Vec<Vec<f64>>) -> TspInstance {
        TspInstance::from_matrix("test", matrix).unwrap()
    }

    #[test]
    fn test_root_matrix() {
        let m = CostMatrix::from_instance(&instance(vec![vec![0.0, 3.0], vec![4.0, 0.0]]));
        assert_eq!(m.size(), 2);
        assert_eq!(m.get(0, 0), INF);
        assert_eq!(m.get(0, 1), 3.0);
        assert_eq!(m.get(1, 0), 4.0);
    }

    #[test]
    fn test_reduce_closes_row_column_and_reverse_edge() {
        let inst = instance(vec![
            vec![INF, 1.0, 4.0, 5.0],
            vec![1.0, INF, 2.0, 6.0],
            vec![4.0, 2.0, INF, 3.0],
            vec![5.0, 6.0, 3.0, INF],
        ]);
        let root = CostMatrix::from_instance(&inst);
        let (child, bound) = root.reduce(0, 1, 0.0);

        for k in 0..4 {
            assert_eq!(child.get(0, k), INF);
            assert_eq!(child.get(k, 1), INF);
        }
        assert_eq!(child.get(1, 0), INF);
        assert!(child.is_reduced());

        // rows 1,2,3 minima: 2, 3, 3 -> then columns 0 (4-3=1,5-3=2 -> 1), 2 (0), 3 (0)
        assert_eq!(bound, 1.0 + 2.0 + 3.0 + 3.0 + 1.0);
        assert!(bound <= 11.0);

        // the parent is never mutated by a child's reduction
        assert_eq!(root, CostMatrix::from_instance(&inst));
    }

    #[test]
    fn test_reduce_accumulates_inherited_cost() {
        let inst = instance(vec![
            vec![INF, 2.0, 2.0],
            vec![2.0, INF, 2.0],
            vec![2.0, 2.0, INF],
        ]);
        let root = CostMatrix::from_instance(&inst);
        let (_, plain) = root.reduce(0, 2, 0.0);
        let (_, inherited) = root.reduce(0, 2, 10.0);
        assert_eq!(inherited, plain + 10.0);
    }

    #[test]
    fn test_reduce_missing_edge_is_infinite() {
        let inst = instance(vec![
            vec![INF, INF, 1.0],
            vec![1.0, INF, 1.0],
            vec![1.0, 1.0, INF],
        ]);
        let root = CostMatrix::from_instance(&inst);
        let (_, bound) = root.reduce(0, 1, 0.0);
        assert_eq!(bound, INF);
    }

    #[test]
    fn test_row_and_column_reduction() {
        let inst = instance(vec![
            vec![INF, 5.0, 7.0],
            vec![3.0, INF, 9.0],
            vec![4.0, 6.0, INF],
        ]);
        let mut m = CostMatrix::from_instance(&inst);
        assert!(!m.is_reduced());
        let rows = m.reduce_rows();
        assert_eq!(rows, 5.0 + 3.0 + 4.0);
        let cols = m.reduce_columns();
        // after rows: [inf 0 2; 0 inf 6; 0 2 inf] -> column 2 min is 2
        assert_eq!(cols, 2.0);
        assert!(m.is_reduced());
    }
}
