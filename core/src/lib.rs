pub mod db;
pub mod instructions;
pub mod models;
pub mod nutrition;
pub mod seed;
pub mod service;
