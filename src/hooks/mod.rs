pub mod use_calendar_date;
pub mod use_connection_point_history;
pub mod use_dashboard;
