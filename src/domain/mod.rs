pub mod controller;
pub mod entity;
pub mod geom;
pub mod physics;
pub mod tile;
