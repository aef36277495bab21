use thiserror::Error;

/// Errors reported by a [`RoutingEngine`](crate::engine::RoutingEngine).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The index space was given no vehicles or a depot outside the nodes.
    #[error("invalid index space: {nodes} nodes, {vehicles} vehicles, depot {depot}")]
    InvalidIndexSpace {
        /// Number of nodes, depot included.
        nodes: usize,
        /// Number of vehicles.
        vehicles: usize,
        /// Depot node.
        depot: usize,
    },
    /// A solver index outside the model was used.
    #[error("unknown solver index {0}")]
    UnknownIndex(usize),
    /// A vehicle outside the fleet was used.
    #[error("unknown vehicle {0}")]
    UnknownVehicle(usize),
    /// A dimension handle that was never issued was used.
    #[error("unknown dimension {0}")]
    UnknownDimension(usize),
    /// An interval handle that was never issued was used.
    #[error("unknown interval {0}")]
    UnknownInterval(usize),
    /// A transit handle that was never issued was used.
    #[error("unknown transit callback {0}")]
    UnknownTransit(usize),
    /// A per-vehicle list did not match the fleet size.
    #[error("{what} has {actual} entries but the model has {expected} vehicles")]
    VehicleArity {
        /// Which argument was mis-sized.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// A per-index list did not match the model size.
    #[error("{what} has {actual} entries but the model has {expected} indices")]
    IndexArity {
        /// Which argument was mis-sized.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
}
