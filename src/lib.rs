pub mod actor;
pub mod api;
pub mod blueprint;
pub mod city;
pub mod config;
pub mod instrumentation;
pub mod persistence;
pub mod session;
