pub mod colors;
pub mod interaction;
pub mod motion;
pub mod time;
