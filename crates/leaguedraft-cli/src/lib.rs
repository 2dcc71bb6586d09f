//! Draft room front ends: the terminal board and the line console.

pub mod commands;
pub mod console;
pub mod render;
pub mod tui;
