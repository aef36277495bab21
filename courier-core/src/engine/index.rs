//! Mapping between graph nodes and solver indices.

use super::error::EngineError;

/// Solver index layout for a single-depot fleet.
///
/// Every non-depot node owns one index, in node order. Each vehicle then
/// owns a start index and an end index, both standing for the depot:
///
/// ```text
/// [ non-depot nodes | starts (one per vehicle) | ends (one per vehicle) ]
/// ```
///
/// Indices below [`IndexSpace::size`] have a successor; end indices do not.
///
/// # Examples
/// ```
/// use courier_core::engine::IndexSpace;
///
/// let space = IndexSpace::new(4, 2, 0)?;
/// assert_eq!(space.size(), 5);
/// assert_eq!(space.start(1), Some(4));
/// assert_eq!(space.end(0), Some(5));
/// assert_eq!(space.index_to_node(5), Some(0));
/// assert_eq!(space.node_to_index(2), Some(1));
/// # Ok::<(), courier_core::engine::EngineError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpace {
    num_nodes: usize,
    num_vehicles: usize,
    depot: usize,
}

impl IndexSpace {
    /// Describe a model with `num_nodes` nodes, depot included.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidIndexSpace`] when there are no vehicles
    /// or `depot` is not a node.
    pub const fn new(
        num_nodes: usize,
        num_vehicles: usize,
        depot: usize,
    ) -> Result<Self, EngineError> {
        if num_vehicles == 0 || depot >= num_nodes {
            return Err(EngineError::InvalidIndexSpace {
                nodes: num_nodes,
                vehicles: num_vehicles,
                depot,
            });
        }
        Ok(Self {
            num_nodes,
            num_vehicles,
            depot,
        })
    }

    /// Number of graph nodes.
    #[must_use]
    pub const fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of vehicles.
    #[must_use]
    pub const fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    /// Depot node.
    #[must_use]
    pub const fn depot(&self) -> usize {
        self.depot
    }

    /// Number of indices that carry a successor (nodes and starts).
    #[must_use]
    pub const fn size(&self) -> usize {
        self.num_nodes - 1 + self.num_vehicles
    }

    /// Number of indices, ends included.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.size() + self.num_vehicles
    }

    /// Start index of `vehicle`.
    #[must_use]
    pub const fn start(&self, vehicle: usize) -> Option<usize> {
        if vehicle < self.num_vehicles {
            Some(self.num_nodes - 1 + vehicle)
        } else {
            None
        }
    }

    /// End index of `vehicle`.
    #[must_use]
    pub const fn end(&self, vehicle: usize) -> Option<usize> {
        if vehicle < self.num_vehicles {
            Some(self.size() + vehicle)
        } else {
            None
        }
    }

    /// Whether `index` is some vehicle's start.
    #[must_use]
    pub const fn is_start(&self, index: usize) -> bool {
        index >= self.num_nodes - 1 && index < self.size()
    }

    /// Whether `index` is some vehicle's end.
    #[must_use]
    pub const fn is_end(&self, index: usize) -> bool {
        index >= self.size() && index < self.total()
    }

    /// Vehicle owning a start or end index.
    #[must_use]
    pub const fn vehicle_of(&self, index: usize) -> Option<usize> {
        if self.is_start(index) {
            Some(index - (self.num_nodes - 1))
        } else if self.is_end(index) {
            Some(index - self.size())
        } else {
            None
        }
    }

    /// Index of a non-depot node. The depot has one index per vehicle and
    /// therefore maps to `None`.
    #[must_use]
    pub const fn node_to_index(&self, node: usize) -> Option<usize> {
        if node >= self.num_nodes || node == self.depot {
            None
        } else if node < self.depot {
            Some(node)
        } else {
            Some(node - 1)
        }
    }

    /// Node behind any index; starts and ends map to the depot.
    #[must_use]
    pub const fn index_to_node(&self, index: usize) -> Option<usize> {
        if index >= self.total() {
            None
        } else if index >= self.num_nodes - 1 {
            Some(self.depot)
        } else if index < self.depot {
            Some(index)
        } else {
            Some(index + 1)
        }
    }
}
