// Presentation helpers shared by the binaries.

pub mod console;
