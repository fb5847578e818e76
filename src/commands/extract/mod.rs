mod export;
mod page_cleanup;
mod run;
mod sources;

pub(crate) use export::validate_table_name;
pub use run::run;
