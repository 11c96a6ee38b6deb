pub mod delivery;
pub mod delivery_image;
pub mod location;
pub mod multi_item_order;
pub mod rider;
pub mod user;
