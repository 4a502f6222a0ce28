pub mod base_data;
