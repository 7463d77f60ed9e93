// Reporter: CSV export of the full ranking and email delivery of that export.

pub mod csv_export;
pub mod email;
