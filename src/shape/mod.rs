//! Validated closed polygons and their JSON description.

pub(crate) mod load;
pub(crate) mod model;
