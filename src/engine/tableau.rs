use std::collections::hash_map::Entry;

use num::Zero;

use crate::containers::HashMap;
use crate::containers::HashSet;
use crate::math::Rational;
use crate::sorrel_assert_moderate;

/// A sparse rational matrix indexed both by row and by column.
///
/// Cells are stored per row; a per-column set of row indices makes column traversal possible
/// without scanning every row. Zero is never stored: [`Tableau::set`] and [`Tableau::update`]
/// remove a cell when its value vanishes, and both indices are kept consistent under every
/// mutation.
#[derive(Clone, Debug, Default)]
pub(crate) struct Tableau {
    /// Non-zero cells of each row, keyed by column.
    rows: Vec<HashMap<usize, Rational>>,
    /// The rows holding a non-zero cell in each column.
    columns: Vec<HashSet<usize>>,
}

impl Tableau {
    pub(crate) fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// The stored cell, or `None` for a (structural) zero.
    pub(crate) fn get(&self, row: usize, column: usize) -> Option<&Rational> {
        self.rows.get(row).and_then(|cells| cells.get(&column))
    }

    /// Stores `value` at `(row, column)`, removing the cell when `value` is zero. Grows the
    /// matrix as needed.
    pub(crate) fn set(&mut self, row: usize, column: usize, value: Rational) {
        self.ensure_shape(row + 1, column + 1);

        if value.is_zero() {
            if self.rows[row].remove(&column).is_some() {
                let _ = self.columns[column].remove(&row);
            }
        } else {
            let _ = self.rows[row].insert(column, value);
            let _ = self.columns[column].insert(row);
        }
    }

    /// Applies `f` to the cell at `(row, column)`, materialising a zero for absent cells and
    /// removing the cell if `f` zeroes it.
    #[allow(unused)]
    pub(crate) fn update(&mut self, row: usize, column: usize, f: impl FnOnce(&mut Rational)) {
        self.ensure_shape(row + 1, column + 1);

        match self.rows[row].entry(column) {
            Entry::Occupied(mut cell) => {
                f(cell.get_mut());
                if cell.get().is_zero() {
                    let _ = cell.remove();
                    let _ = self.columns[column].remove(&row);
                }
            }
            Entry::Vacant(slot) => {
                let mut value = Rational::zero();
                f(&mut value);
                if !value.is_zero() {
                    let _ = slot.insert(value);
                    let _ = self.columns[column].insert(row);
                }
            }
        }
    }

    /// The non-zero cells of a row, in unspecified (but deterministic) order.
    pub(crate) fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, &Rational)> + '_ {
        self.rows[row].iter().map(|(&column, value)| (column, value))
    }

    /// Applies `f` to every non-zero cell of a row in place. `f` must not zero a cell.
    pub(crate) fn update_row(&mut self, row: usize, mut f: impl FnMut(usize, &mut Rational)) {
        for (&column, value) in self.rows[row].iter_mut() {
            f(column, value);
            sorrel_assert_moderate!(!value.is_zero(), "row updates may not zero cells");
        }
    }

    /// The non-zero cells of a column, in unspecified (but deterministic) order.
    pub(crate) fn column_entries(
        &self,
        column: usize,
    ) -> impl Iterator<Item = (usize, &Rational)> + '_ {
        self.columns[column]
            .iter()
            .map(move |&row| (row, &self.rows[row][&column]))
    }

    /// Swaps the basic role of `pivot_row` with the non-basic role of `pivot_column`: inverts the
    /// pivot row and eliminates the pivot column from every other row.
    ///
    /// The non-zero support of the pivot row and of the pivot column is unchanged; cells of other
    /// rows may appear or disappear, and the column index tracks them exactly. The pivot cell must
    /// be non-zero.
    pub(crate) fn pivot(&mut self, pivot_row: usize, pivot_column: usize) {
        // The pivot row is detached so other rows can be mutated while it is traversed.
        let mut row = std::mem::take(&mut self.rows[pivot_row]);
        let coefficient = row
            .remove(&pivot_column)
            .expect("pivoting requires a non-zero pivot cell");
        let inverse = coefficient.recip();

        // Invert the pivot row: a_ik := -a_ik / a_ij for k != j.
        for value in row.values_mut() {
            *value = -(&*value / &coefficient);
        }

        // Eliminate the pivot column from every other row holding it.
        let other_rows: Vec<usize> = self.columns[pivot_column]
            .iter()
            .copied()
            .filter(|&other| other != pivot_row)
            .collect();
        for other in other_rows {
            let factor = self.rows[other]
                .remove(&pivot_column)
                .expect("the column index lists only rows with a non-zero cell");

            for (&column, pivot_value) in &row {
                match self.rows[other].entry(column) {
                    Entry::Occupied(mut cell) => {
                        *cell.get_mut() += pivot_value * &factor;
                        if cell.get().is_zero() {
                            let _ = cell.remove();
                            let _ = self.columns[column].remove(&other);
                        }
                    }
                    Entry::Vacant(slot) => {
                        // The product of two non-zero rationals cannot vanish.
                        let _ = slot.insert(pivot_value * &factor);
                        let _ = self.columns[column].insert(other);
                    }
                }
            }

            // a_kj := a_kj * (1 / a_ij), which stays non-zero.
            let _ = self.rows[other].insert(pivot_column, &factor * &inverse);
        }

        let _ = row.insert(pivot_column, inverse);
        self.rows[pivot_row] = row;
    }

    /// Grows the matrix to at least the given shape.
    pub(crate) fn resize(&mut self, n_rows: usize, n_columns: usize) {
        self.ensure_shape(n_rows, n_columns);
    }

    fn ensure_shape(&mut self, n_rows: usize, n_columns: usize) {
        if self.rows.len() < n_rows {
            self.rows.resize_with(n_rows, HashMap::default);
        }
        if self.columns.len() < n_columns {
            self.columns.resize_with(n_columns, HashSet::default);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::integer;
    use crate::math::ratio;

    fn dense(tableau: &Tableau) -> Vec<Vec<Rational>> {
        (0..tableau.n_rows())
            .map(|row| {
                (0..tableau.n_columns())
                    .map(|column| {
                        tableau
                            .get(row, column)
                            .cloned()
                            .unwrap_or_else(Rational::zero)
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn setting_zero_removes_the_cell() {
        let mut tableau = Tableau::default();
        tableau.set(0, 0, integer(3));
        tableau.set(0, 0, integer(0));

        assert_eq!(tableau.get(0, 0), None);
        assert_eq!(tableau.column_entries(0).count(), 0);
    }

    #[test]
    fn update_materialises_and_removes_cells() {
        let mut tableau = Tableau::default();
        tableau.update(1, 2, |cell| *cell += integer(4));

        assert_eq!(tableau.get(1, 2), Some(&integer(4)));

        tableau.update(1, 2, |cell| *cell -= integer(4));

        assert_eq!(tableau.get(1, 2), None);
        assert_eq!(tableau.column_entries(2).count(), 0);
    }

    #[test]
    fn update_row_mutates_cells_in_place() {
        let mut tableau = Tableau::default();
        tableau.set(0, 0, integer(2));
        tableau.set(0, 3, integer(-1));

        tableau.update_row(0, |_, value| *value = -value.clone());

        assert_eq!(tableau.get(0, 0), Some(&integer(-2)));
        assert_eq!(tableau.get(0, 3), Some(&integer(1)));
    }

    #[test]
    fn column_entries_track_cells_across_rows() {
        let mut tableau = Tableau::default();
        tableau.set(0, 1, integer(2));
        tableau.set(2, 1, integer(-5));
        tableau.set(1, 0, integer(7));

        let mut rows: Vec<usize> = tableau.column_entries(1).map(|(row, _)| row).collect();
        rows.sort_unstable();

        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn pivoting_inverts_the_pivot_row() {
        // Row 0: x_b = 2 x + 4 y. Pivoting on (0, x) must produce x = 1/2 x_b - 2 y.
        let mut tableau = Tableau::default();
        tableau.set(0, 0, integer(2));
        tableau.set(0, 1, integer(4));

        tableau.pivot(0, 0);

        assert_eq!(tableau.get(0, 0), Some(&ratio(1, 2)));
        assert_eq!(tableau.get(0, 1), Some(&integer(-2)));
    }

    #[test]
    fn pivoting_eliminates_the_column_from_other_rows() {
        // Row 0: u = x + y, row 1: v = x - y. After pivoting on (0, x) we have x = u - y and
        // therefore v = u - 2 y.
        let mut tableau = Tableau::default();
        tableau.set(0, 0, integer(1));
        tableau.set(0, 1, integer(1));
        tableau.set(1, 0, integer(1));
        tableau.set(1, 1, integer(-1));

        tableau.pivot(0, 0);

        assert_eq!(
            dense(&tableau),
            vec![
                vec![integer(1), integer(-1)],
                vec![integer(1), integer(-2)],
            ]
        );
    }

    #[test]
    fn pivoting_removes_cancelled_cells_from_both_indices() {
        // Row 0: u = x + y, row 1: v = x + y. After pivoting on (0, x), row 1 becomes v = u with
        // the y cell cancelled.
        let mut tableau = Tableau::default();
        tableau.set(0, 0, integer(1));
        tableau.set(0, 1, integer(1));
        tableau.set(1, 0, integer(1));
        tableau.set(1, 1, integer(1));

        tableau.pivot(0, 0);

        assert_eq!(tableau.get(1, 1), None);
        assert!(tableau.column_entries(1).all(|(row, _)| row == 0));
    }

    #[test]
    fn pivoting_back_restores_the_original_tableau() {
        let mut tableau = Tableau::default();
        tableau.set(0, 0, integer(2));
        tableau.set(0, 1, integer(-3));
        tableau.set(1, 0, integer(5));
        tableau.set(1, 1, ratio(1, 2));
        let original = dense(&tableau);

        tableau.pivot(0, 0);
        tableau.pivot(0, 0);

        assert_eq!(dense(&tableau), original);
    }
}
