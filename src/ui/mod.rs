// Presentation seams for the UI layer.
// Rendering itself lives outside this crate; these modules prepare what it shows.

mod map;
mod views;

pub use map::*;
pub use views::*;
