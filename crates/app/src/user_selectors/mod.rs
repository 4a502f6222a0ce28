pub mod front_month;
