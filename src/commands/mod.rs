pub mod config;
mod scan;
mod show;
mod status;

pub use config::Options;
pub use scan::scan;
pub use show::show;
pub use status::status;
