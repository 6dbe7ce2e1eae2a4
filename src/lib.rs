pub mod app;
pub mod controller;
pub mod device;
pub mod model;
pub mod registry;
pub mod ui;
