pub mod exit;
pub mod game;
pub mod scene;
pub mod start;
