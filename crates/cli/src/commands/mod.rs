pub mod index;
pub mod ls;
pub mod status;
