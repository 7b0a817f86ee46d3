pub mod dashboard;
pub mod menu;
pub mod progress_bar;
pub mod staff;
pub mod stats_dashboard;
pub mod stats_sidebar;
