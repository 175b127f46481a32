use serde::{Deserialize, Serialize};

use crate::entity::NodeId;
use crate::error::{AmslaError, Result};

/// Nonzero entries of a square sparse matrix in (row, column, value) form.
///
/// Indices are 1-based. Construction is the only place the raw triplet is
/// validated, so anything holding a `TripletMatrix` can trust its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TripletParts")]
pub struct TripletMatrix {
    rows: Vec<NodeId>,
    columns: Vec<NodeId>,
    values: Vec<f64>,
}

/// Unvalidated wire shape; deserialization goes through `TripletMatrix::new`.
#[derive(Deserialize)]
struct TripletParts {
    rows: Vec<NodeId>,
    columns: Vec<NodeId>,
    values: Vec<f64>,
}

impl TryFrom<TripletParts> for TripletMatrix {
    type Error = AmslaError;

    fn try_from(parts: TripletParts) -> Result<Self> {
        Self::new(parts.rows, parts.columns, parts.values)
    }
}

impl TripletMatrix {
    pub fn new(rows: Vec<NodeId>, columns: Vec<NodeId>, values: Vec<f64>) -> Result<Self> {
        if rows.len() != columns.len() || rows.len() != values.len() {
            return Err(AmslaError::InvalidInput(format!(
                "triplet arrays differ in length: rows={}, columns={}, values={}",
                rows.len(),
                columns.len(),
                values.len()
            )));
        }

        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(AmslaError::InvalidInput(format!(
                "value at position {} is not finite ({})",
                pos, values[pos]
            )));
        }

        if let Some(pos) = rows
            .iter()
            .zip(&columns)
            .position(|(&r, &c)| r == 0 || c == 0)
        {
            return Err(AmslaError::InvalidInput(format!(
                "entry at position {} has a zero index; indices are 1-based",
                pos
            )));
        }

        Ok(Self {
            rows,
            columns,
            values,
        })
    }

    /// Unit-valued triplet from (row, column) pairs.
    pub fn from_pairs(pairs: &[(NodeId, NodeId)]) -> Result<Self> {
        let rows = pairs.iter().map(|&(r, _)| r).collect();
        let columns = pairs.iter().map(|&(_, c)| c).collect();
        Self::new(rows, columns, vec![1.0; pairs.len()])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[NodeId] {
        &self.rows
    }

    pub fn columns(&self) -> &[NodeId] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate entries as `(row, column, value)`.
    pub fn entries(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.columns)
            .zip(&self.values)
            .map(|((&r, &c), &v)| (r, c, v))
    }
}
