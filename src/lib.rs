pub mod app;
pub mod editor;
pub mod history;
pub mod io;
pub mod logger;
pub mod snapshot;
pub mod surface;
pub mod tabs;
pub mod tools;
