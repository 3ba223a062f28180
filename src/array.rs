//! Vertex sequence with coincident-point filtering.
//!
//! The stroker and dasher work on flattened polylines where every vertex
//! knows the distance to its successor. [`VertexSequence`] keeps that
//! invariant while points are appended and drops zero-length edges.

use crate::math::{calc_distance, VERTEX_DIST_EPSILON};

/// A vertex with the distance to the next vertex in its sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexDist {
    pub x: f64,
    pub y: f64,
    pub dist: f64,
}

impl VertexDist {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, dist: 0.0 }
    }

    /// Store the distance to `val`. Returns `false` when the two points
    /// coincide.
    pub fn calc_dist(&mut self, val: &VertexDist) -> bool {
        self.dist = calc_distance(self.x, self.y, val.x, val.y);
        self.dist > VERTEX_DIST_EPSILON
    }
}

/// Polyline storage that never holds two coincident neighbours.
#[derive(Debug, Clone, Default)]
pub struct VertexSequence {
    vertices: Vec<VertexDist>,
}

impl VertexSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Append a point. A point coinciding with the current last one is
    /// dropped; otherwise the last vertex's `dist` is updated.
    pub fn add(&mut self, x: f64, y: f64) {
        let v = VertexDist::new(x, y);
        if let Some(last) = self.vertices.last_mut() {
            if !last.calc_dist(&v) {
                return;
            }
        }
        self.vertices.push(v);
    }

    /// Finish the sequence. For a closed sequence, trailing points that
    /// coincide with the first are removed and the last vertex's `dist`
    /// becomes the closing edge length.
    pub fn close(&mut self, closed: bool) {
        if closed {
            while self.vertices.len() > 1 {
                let first = self.vertices[0];
                let n = self.vertices.len();
                if self.vertices[n - 1].calc_dist(&first) {
                    break;
                }
                self.vertices.pop();
            }
        } else if let Some(last) = self.vertices.last_mut() {
            last.dist = 0.0;
        }
    }

    pub fn remove_all(&mut self) {
        self.vertices.clear();
    }

    /// Vertex `i` counted cyclically.
    #[inline]
    pub fn cyclic(&self, i: usize) -> &VertexDist {
        &self.vertices[i % self.vertices.len()]
    }

    pub fn as_slice(&self) -> &[VertexDist] {
        &self.vertices
    }

    /// Total length of the polyline, including the closing edge if closed.
    pub fn length(&self, closed: bool) -> f64 {
        let n = self.vertices.len();
        if n < 2 {
            return 0.0;
        }
        let edges = if closed { n } else { n - 1 };
        self.vertices[..edges].iter().map(|v| v.dist).sum()
    }
}

impl core::ops::Index<usize> for VertexSequence {
    type Output = VertexDist;

    fn index(&self, i: usize) -> &VertexDist {
        &self.vertices[i]
    }
}

// ============================================================================
// Tests
// ============================================================================
