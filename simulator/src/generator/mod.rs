pub mod profile;
pub mod sites;
