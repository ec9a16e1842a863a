mod http_report_sink;
mod logging_report_sink;

pub use http_report_sink::{HttpReportSink, SESSION_ID_HEADER};
pub use logging_report_sink::LoggingReportSink;
