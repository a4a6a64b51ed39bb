pub mod drv8847;
pub mod encoder;
pub mod motor;
