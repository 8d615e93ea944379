pub mod exchange;
pub mod machine;
pub mod payment;
pub mod quotation;
