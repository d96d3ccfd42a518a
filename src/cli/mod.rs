pub mod calc;
pub mod convert;
pub mod history;
pub mod labels;
pub mod rates;
pub mod setup;
pub mod ui;
