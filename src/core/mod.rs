// Core modules modeling the envelope protocol, symbology names, and errors.
pub mod envelope;
pub mod error;
pub mod symbology;
