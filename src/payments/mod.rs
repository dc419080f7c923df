pub mod order_id;
pub mod phonepe;
