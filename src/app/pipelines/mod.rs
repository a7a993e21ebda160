pub mod customer_group_points;
pub mod customer_points;

pub use customer_group_points::CustomerGroupPointsPipeline;
pub use customer_points::CustomerPointsPipeline;
