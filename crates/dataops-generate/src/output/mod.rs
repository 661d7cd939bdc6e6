pub mod csv;

pub use self::csv::write_table_csv;
