//! Pure computational algorithms for the Hybrid A* planner.
//!
//! This module contains pure algorithmic implementations with no I/O dependencies.
//!
//! # Architecture
//!
//! - **No I/O**: Algorithms contain only computation logic
//! - **Reusable**: driven entirely by grids/poses passed in, no hidden state
//!
//! # Available Algorithms
//!
//! - **astar2d**: 2D grid A* distance heuristic, also used for the Voronoi-guided
//!   global guidance map
//! - **voronoi**: obstacle-proximity potential field via KD-tree lookups
//! - **nhwo**: non-holonomic-without-obstacles heuristic cache
//! - **reeds_shepp**: analytic curvature-bounded curves between poses
//! - **motion**: bicycle-model forward simulation and rear-axis pivot

pub mod astar2d;
pub mod motion;
pub mod nhwo;
pub mod reeds_shepp;
pub mod voronoi;
