pub mod digital;
pub mod pwm;
pub mod servo;
