pub mod donation_dto;
pub mod request_dto;
pub mod user_dto;
