pub mod categories;
pub mod items;
pub mod offers;
pub mod orders;
pub mod reviews;
pub mod search;
pub mod settings;
pub mod sliders;
