pub mod shop_mode_file;
pub mod snapshot_store;
