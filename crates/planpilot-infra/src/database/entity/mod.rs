//! SeaORM entities.

pub mod subscription;
