pub mod handlers;

pub use handlers::{
    ExportOutcome, ScanOptions, export_map, load_har, render_code, render_listing,
    render_page_map, render_response, run_scan, select_exchange,
};
