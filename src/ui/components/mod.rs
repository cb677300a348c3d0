pub mod chart;
pub mod scramble_bar;
pub mod solve_detail;
pub mod solve_list;
pub mod stats_sidebar;
pub mod timer_display;
