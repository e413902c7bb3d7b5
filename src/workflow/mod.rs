pub mod item_ctx;
pub mod listing_flow;

pub use item_ctx::ItemCtx;
pub use listing_flow::ListingFlow;
