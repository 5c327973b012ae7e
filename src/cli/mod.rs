pub mod candles;
pub mod catalog;
pub mod category;
pub mod returns;
pub mod setup;
pub mod ui;
