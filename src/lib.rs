pub mod birth;
pub mod chart;
pub mod config;
pub mod encoding;
pub mod environment;
pub mod errors;
pub mod gateway;
pub mod library;
pub mod normalization;
pub mod routes;
