pub mod icons;
pub mod output;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, section, status, success, warn};
pub use theme::{theme, Theme, QUIET_ENV};
