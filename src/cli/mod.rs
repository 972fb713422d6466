pub mod export;
pub mod forecast;
pub mod learn;
pub mod lesson;
pub mod quiz;
pub mod setup;
pub mod ui;
