//! Foundry Core -- belt transport for a grid-based factory sandbox.
//!
//! Builds on the occupancy index in `foundry-spatial` with two derived layers
//! of state:
//!
//! 1. **Belt graph** -- [`network::BeltNetwork`] keeps one tile per belt
//!    occupant with symmetric links to its four cardinal neighbors.
//! 2. **Transport** -- [`transport::TransportSim`] keeps one segment per tile
//!    and moves discrete items along them on a fixed timestep.
//!
//! [`factory::Factory`] owns the index, graph and simulator and forwards every
//! placement change through them in that order:
//!
//! ```rust,ignore
//! let mut factory = Factory::new(FactoryConfig::default())?;
//! factory.place(GridPosition::new(0, 0), TileKind::Single, Layer::Belt, Rotation::East)?;
//! factory.place(GridPosition::new(1, 0), TileKind::Single, Layer::Belt, Rotation::East)?;
//! factory.advance_seconds(frame_dt);
//! for item in factory.items() {
//!     let transform = factory.item_world_transform(&item);
//! }
//! ```
//!
//! All positions inside the tick are [`fixed::Fixed64`], so equal inputs give
//! bit-identical runs. The tick length is rounded down when converted, so
//! frames that add up to the same elapsed seconds run the same ticks however
//! the host slices them.

pub mod config;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod event;
pub mod factory;
pub mod fixed;
pub mod id;
pub mod network;
pub mod query;
pub mod sim;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use foundry_spatial as spatial;
