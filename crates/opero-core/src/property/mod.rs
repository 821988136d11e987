//! Property (listing) domain module.

mod filter;
mod model;
mod repository;

pub use filter::PropertyFilter;
pub use model::{
    ListingType, NewProperty, PortfolioStats, Property, PropertyStatus, PropertyType,
    PropertyUpdate,
};
pub use repository::PropertyRepository;
