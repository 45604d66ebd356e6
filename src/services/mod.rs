pub mod eval_service;
pub mod grading_service;
pub mod notify_service;
pub mod report_service;
