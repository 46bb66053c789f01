//! Chart descriptions for the wind-turbine dashboard.
//!
//! Builders are stateless: tagged rows plus a fixed field mapping go in, a
//! serializable figure comes out. The chart set owns the figures of one
//! generate action and the row table the linked-selection callbacks rejoin.

pub mod builders;
pub mod figure;
pub mod set;

pub use figure::{Figure, Layout, Trace};
pub use set::{
    ChartId, ChartInputs, ChartSet, ChartSource, SelectionUpdate, SeriesKind,
    EFFICIENCY_BIN_WIDTH,
};
