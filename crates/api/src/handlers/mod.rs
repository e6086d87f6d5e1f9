//! REST-Handler der Pfoertner-API

pub mod auth;
pub mod benutzer;
