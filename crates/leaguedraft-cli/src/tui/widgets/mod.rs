// Board panels.

pub mod available;
pub mod draft_log;
pub mod help_bar;
pub mod quit_confirm;
pub mod status_bar;
pub mod team_panel;
