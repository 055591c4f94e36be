//! Network reduction, pipe dimensioning and result summaries

pub mod dimension;
pub mod reduce;
pub mod summary;

pub use dimension::{
    calculate_diameter_velocity_loss, calculate_volumeflow, dimension_network, simultaneity_factor,
    size_edge, water_properties,
};
pub use reduce::{Reduction, reduce_interconnection, reduce_network};
pub use summary::{DnSummary, NetworkSummary, summarize_network};
