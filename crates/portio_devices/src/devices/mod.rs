pub mod mcp4725;
pub mod mpu6050;
