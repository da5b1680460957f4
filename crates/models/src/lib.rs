pub mod errors;
pub mod db;
pub mod fields;
pub mod customer;
pub mod lead;
pub mod opportunity;
pub mod activity;
pub mod email_log;

#[cfg(test)]
mod tests;
