pub mod console;
pub mod roster;
pub mod system;
