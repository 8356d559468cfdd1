pub mod check;
pub mod cli;
pub mod list;
pub mod simulate;
