//! Venue dashboard endpoints
//!
//! Customers, inventory and royalties, each served through the gateway
//! pipeline.

pub mod handlers;
pub mod model;
pub mod router;
pub mod store;

pub use handlers::{VenuePolicies, VenueState};
pub use router::venue_router;
pub use store::{MemoryVenueRepository, PgVenueRepository};
