//! File input and output: delimited tables in, JSON artifacts and scored
//! tables out.
pub mod output;
pub mod table_reader;

pub use output::{write_json_atomic, write_scored_table};
pub use table_reader::{read_table, read_table_with_config, TableReaderConfig};
